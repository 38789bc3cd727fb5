//! Remote skin analysis: invoking the analysis endpoint and reconciling its
//! response shapes into one [`AnalysisResult`](skinscan_shared::AnalysisResult).
//!
//! The endpoint is a black box that answers with a JSON array; element 0 is
//! the raw payload. Payloads come in (at least) two shapes, modelled as
//! [`RawPayload::Flat`] and [`RawPayload::Rich`], and [`normalize`] turns
//! either into the canonical result.

mod invoke;
mod normalize;
mod payload;

pub use invoke::{AnalysisRequest, Analyzer, HttpAnalyzer, UploadData, first_payload};
pub use normalize::{normalize, normalize_payload};
pub use payload::{DetailedIssue, FlatPayload, PayloadSummary, RawPayload, RichPayload};
