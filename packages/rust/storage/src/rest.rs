//! Supabase-compatible storage REST backend.

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{CACHE_CONTROL, CONTENT_TYPE};
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::keys::validate_key;
use crate::{ObjectStore, StorageError, StorageResult, UploadOptions, UploadReceipt};

/// User-Agent string for storage requests.
const USER_AGENT: &str = concat!("skinscan/", env!("CARGO_PKG_VERSION"));

/// Body returned by `POST /storage/v1/object/{bucket}/{path}`.
#[derive(Debug, Deserialize)]
struct UploadResponse {
    #[serde(rename = "Key")]
    key: String,
    #[serde(rename = "Id", default)]
    id: Option<String>,
}

/// Storage REST API client.
#[derive(Clone)]
pub struct RestObjectStore {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl std::fmt::Debug for RestObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestObjectStore")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl RestObjectStore {
    /// `endpoint` is the project base URL, e.g. `https://abc.supabase.co`.
    pub fn new(endpoint: &str, api_key: impl Into<String>) -> StorageResult<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| StorageError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    fn object_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/storage/v1/object/{bucket}/{path}", self.endpoint)
    }
}

#[async_trait]
impl ObjectStore for RestObjectStore {
    #[instrument(skip_all, fields(bucket = %bucket, path = %path))]
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        options: &UploadOptions,
    ) -> StorageResult<UploadReceipt> {
        validate_key(bucket)?;
        validate_key(path)?;

        let url = self.object_url(bucket, path);
        debug!(%url, len = bytes.len(), "uploading object");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .header("apikey", &self.api_key)
            .header(CACHE_CONTROL, format!("max-age={}", options.cache_control))
            .header(CONTENT_TYPE, &options.content_type)
            .header("x-upsert", options.upsert.to_string())
            .body(bytes)
            .send()
            .await
            .map_err(|e| StorageError::Backend(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            if status == reqwest::StatusCode::CONFLICT {
                return Err(StorageError::AlreadyExists(format!("{bucket}/{path}")));
            }
            return Err(StorageError::UploadRejected {
                status: status.as_u16(),
                message,
            });
        }

        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| StorageError::Backend(format!("{url}: unreadable upload response: {e}")))?;

        Ok(UploadReceipt {
            path: path.to_string(),
            id: body.id.unwrap_or_else(|| body.key.clone()),
            full_path: body.key,
        })
    }

    fn public_address(&self, bucket: &str, path: &str) -> StorageResult<String> {
        validate_key(bucket)?;
        validate_key(path)?;
        Ok(format!(
            "{}/storage/v1/object/public/{bucket}/{path}",
            self.endpoint
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_bytes, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn options() -> UploadOptions {
        UploadOptions {
            content_type: "image/jpeg".into(),
            cache_control: "3600".into(),
            upsert: false,
        }
    }

    #[tokio::test]
    async fn upload_sends_headers_and_parses_receipt() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/storage/v1/object/skin_image/uploads/1-abc.jpg"))
            .and(header("authorization", "Bearer service-key"))
            .and(header("apikey", "service-key"))
            .and(header("x-upsert", "false"))
            .and(header("cache-control", "max-age=3600"))
            .and(header("content-type", "image/jpeg"))
            .and(body_bytes(vec![1u8, 2, 3]))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "Key": "skin_image/uploads/1-abc.jpg",
                "Id": "8f0c6a52-0000-4000-8000-000000000001"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let store = RestObjectStore::new(&server.uri(), "service-key").unwrap();
        let receipt = store
            .upload("skin_image", "uploads/1-abc.jpg", vec![1, 2, 3], &options())
            .await
            .unwrap();

        assert_eq!(receipt.path, "uploads/1-abc.jpg");
        assert_eq!(receipt.full_path, "skin_image/uploads/1-abc.jpg");
        assert_eq!(receipt.id, "8f0c6a52-0000-4000-8000-000000000001");
    }

    #[tokio::test]
    async fn missing_id_falls_back_to_key() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "Key": "skin_image/uploads/2-def.png"
            })))
            .mount(&server)
            .await;

        let store = RestObjectStore::new(&server.uri(), "k").unwrap();
        let receipt = store
            .upload("skin_image", "uploads/2-def.png", vec![9], &options())
            .await
            .unwrap();
        assert_eq!(receipt.id, "skin_image/uploads/2-def.png");
    }

    #[tokio::test]
    async fn quota_failure_is_upload_rejected() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(413).set_body_string("Payload too large"))
            .mount(&server)
            .await;

        let store = RestObjectStore::new(&server.uri(), "k").unwrap();
        let err = store
            .upload("skin_image", "uploads/big.jpg", vec![0; 16], &options())
            .await
            .unwrap_err();

        match err {
            StorageError::UploadRejected { status, message } => {
                assert_eq!(status, 413);
                assert!(message.contains("too large"));
            }
            other => panic!("expected UploadRejected, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn conflict_is_already_exists() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(409))
            .mount(&server)
            .await;

        let store = RestObjectStore::new(&server.uri(), "k").unwrap();
        let err = store
            .upload("skin_image", "uploads/dup.jpg", vec![1], &options())
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::AlreadyExists(_)));
    }

    #[test]
    fn public_address_layout() {
        let store = RestObjectStore::new("https://proj.supabase.co/", "k").unwrap();
        let address = store
            .public_address("skin_image", "uploads/3-xyz.webp")
            .unwrap();
        assert_eq!(
            address,
            "https://proj.supabase.co/storage/v1/object/public/skin_image/uploads/3-xyz.webp"
        );
    }

    #[tokio::test]
    async fn traversal_key_never_reaches_network() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let store = RestObjectStore::new(&server.uri(), "k").unwrap();
        let err = store
            .upload("skin_image", "../escape.jpg", vec![1], &options())
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidKey(_)));
    }
}
