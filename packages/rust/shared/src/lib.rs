//! Shared types, error model, and configuration for skinscan.
//!
//! This crate is the foundation depended on by all other skinscan crates.
//! It provides:
//! - [`SkinScanError`] and the per-stage error enums
//! - Domain types ([`SourceFile`], [`StoredObject`], [`AnalysisResult`], [`Issue`], [`Severity`])
//! - Configuration ([`AppConfig`], [`PublishConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AnalyzerConfig, AppConfig, PublishConfig, StorageBackend, StorageConfig, config_dir,
    config_file_path, expand_home, init_config, load_config, load_config_from,
    validate_storage_key,
};
pub use error::{
    FailedStage, InvokeError, NormalizeError, PublishError, Result, SkinScanError,
    ValidationError,
};
pub use types::{
    AnalysisResult, DailyRoutines, Issue, ProductCategory, SessionId, Severity, SourceFile,
    StoredObject,
};
