//! Error types for skinscan.
//!
//! Each pipeline stage has its own error enum so the orchestrator can tell
//! which stage failed. [`SkinScanError`] wraps all of them for callers that
//! only care about "did the attempt work". App crates (cli) wrap this with
//! `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Candidate file was rejected before anything else ran.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Declared media type does not start with `image/`.
    #[error("not an image (declared media type: {media_type:?})")]
    NotAnImage { media_type: String },
}

/// Object storage refused the upload or could not resolve an address.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PublishError {
    #[error("storage rejected upload: {0}")]
    StorageRejected(String),
}

/// The remote analysis call did not produce a usable payload.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvokeError {
    /// Non-success HTTP status from the analysis endpoint.
    #[error("analysis endpoint rejected request with HTTP {0}")]
    RemoteRejected(u16),

    /// Successful response carrying an empty or missing result list.
    #[error("analysis endpoint returned no data")]
    NoData,

    /// Response body was not a JSON array.
    #[error("analysis endpoint returned an unexpected body: {0}")]
    MalformedBody(String),

    /// Connection, TLS, or body read failure.
    #[error("analysis request failed: {0}")]
    Transport(String),
}

/// The raw payload could not be mapped into an [`AnalysisResult`](crate::AnalysisResult).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NormalizeError {
    #[error("malformed analysis payload: {0}")]
    MalformedPayload(String),
}

impl NormalizeError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedPayload(msg.into())
    }
}

/// Pipeline stage that produced a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailedStage {
    Validation,
    Upload,
    Analysis,
}

impl std::fmt::Display for FailedStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Validation => "validation",
            Self::Upload => "upload",
            Self::Analysis => "analysis",
        })
    }
}

/// Top-level error type for all skinscan operations.
#[derive(Debug, thiserror::Error)]
pub enum SkinScanError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Publish(#[from] PublishError),

    #[error(transparent)]
    Invoke(#[from] InvokeError),

    #[error(transparent)]
    Normalize(#[from] NormalizeError),

    /// The session was cleared or replaced before this result arrived.
    #[error("session superseded before completion")]
    Superseded,

    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, SkinScanError>;

impl SkinScanError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Which pipeline stage this error belongs to, if any.
    pub fn failed_stage(&self) -> Option<FailedStage> {
        match self {
            Self::Validation(_) => Some(FailedStage::Validation),
            Self::Publish(_) => Some(FailedStage::Upload),
            Self::Invoke(_) | Self::Normalize(_) => Some(FailedStage::Analysis),
            Self::Superseded | Self::Config { .. } | Self::Io { .. } => None,
        }
    }

    /// The single notification shown to the user for this failure.
    ///
    /// Every "no usable analysis" cause collapses into the same message.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(ValidationError::NotAnImage { .. }) => {
                "Please select an image file".into()
            }
            Self::Publish(_) => "Upload failed, please try again".into(),
            Self::Invoke(InvokeError::RemoteRejected(status)) => {
                format!("Analysis service error (HTTP {status})")
            }
            Self::Invoke(InvokeError::Transport(_)) => {
                "Could not reach the analysis service".into()
            }
            Self::Invoke(InvokeError::NoData | InvokeError::MalformedBody(_))
            | Self::Normalize(NormalizeError::MalformedPayload(_)) => "Analysis failed".into(),
            Self::Superseded => "Analysis cancelled".into(),
            Self::Config { message } => message.clone(),
            Self::Io { .. } => self.to_string(),
        }
    }
}
