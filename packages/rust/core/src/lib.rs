//! Core orchestration for skinscan.
//!
//! - [`validator`]: the image media type gate
//! - [`publisher`]: upload to object storage and public address resolution
//! - [`pipeline`]: the session state machine tying the stages together

pub mod pipeline;
pub mod publisher;
pub mod validator;

pub use pipeline::{Orchestrator, ProgressReporter, SessionView, SilentProgress, Stage};
pub use publisher::BlobPublisher;
pub use validator::validate;
