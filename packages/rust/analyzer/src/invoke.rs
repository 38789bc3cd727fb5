//! Analysis invoker: one POST per stored image, first array element wins.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, instrument};

use skinscan_shared::{AnalyzerConfig, InvokeError, Result, SkinScanError, StoredObject};

/// User-Agent string for analysis requests.
const USER_AGENT: &str = concat!("skinscan/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// Storage identifiers as the analysis endpoint expects them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadData {
    pub path: String,
    pub id: String,
    #[serde(rename = "fullPath")]
    pub full_path: String,
}

/// Body of the analysis POST.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisRequest {
    pub upload_data: UploadData,
    pub public_url: String,
    pub file_path: String,
    pub timestamp: DateTime<Utc>,
}

impl AnalysisRequest {
    /// Describe a freshly published object, stamped with the current time.
    pub fn for_object(stored: &StoredObject) -> Self {
        Self {
            upload_data: UploadData {
                path: stored.storage_path.clone(),
                id: stored.storage_id.clone(),
                full_path: stored.full_path.clone(),
            },
            public_url: stored.public_address.clone(),
            file_path: stored.storage_path.clone(),
            timestamp: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// Analyzer
// ---------------------------------------------------------------------------

/// Anything that can turn an analysis request into a raw payload.
#[async_trait]
pub trait Analyzer: Send + Sync {
    /// Returns element 0 of the analyzer's response.
    async fn analyze(&self, request: &AnalysisRequest) -> std::result::Result<Value, InvokeError>;
}

/// The HTTP analysis endpoint.
#[derive(Debug, Clone)]
pub struct HttpAnalyzer {
    client: Client,
    endpoint: String,
}

impl HttpAnalyzer {
    /// Build a client for `endpoint`. `timeout` of `None` waits indefinitely.
    pub fn new(endpoint: &str, timeout: Option<Duration>) -> Result<Self> {
        let parsed = url::Url::parse(endpoint)
            .map_err(|e| SkinScanError::config(format!("invalid analyzer endpoint '{endpoint}': {e}")))?;

        let mut builder = Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| SkinScanError::config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: parsed.to_string(),
        })
    }

    pub fn from_config(config: &AnalyzerConfig) -> Result<Self> {
        Self::new(
            &config.endpoint,
            config.timeout_secs.map(Duration::from_secs),
        )
    }
}

#[async_trait]
impl Analyzer for HttpAnalyzer {
    #[instrument(skip_all, fields(endpoint = %self.endpoint, file_path = %request.file_path))]
    async fn analyze(&self, request: &AnalysisRequest) -> std::result::Result<Value, InvokeError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| InvokeError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| InvokeError::Transport(format!("failed to read body: {e}")))?;

        debug!(%status, len = body.len(), "analysis response received");

        let payload = first_payload(status, &body)?;
        info!("analysis payload received");
        Ok(payload)
    }
}

/// Extract the raw payload from an analysis response.
///
/// Only element 0 of the returned array is used; further elements are ignored.
pub fn first_payload(status: StatusCode, body: &str) -> std::result::Result<Value, InvokeError> {
    if !status.is_success() {
        return Err(InvokeError::RemoteRejected(status.as_u16()));
    }

    if body.trim().is_empty() {
        return Err(InvokeError::NoData);
    }

    let value: Value =
        serde_json::from_str(body).map_err(|e| InvokeError::MalformedBody(e.to_string()))?;

    match value {
        Value::Null => Err(InvokeError::NoData),
        Value::Array(items) => match items.into_iter().next() {
            None | Some(Value::Null) => Err(InvokeError::NoData),
            Some(first) => Ok(first),
        },
        other => Err(InvokeError::MalformedBody(format!(
            "expected a JSON array, got {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
