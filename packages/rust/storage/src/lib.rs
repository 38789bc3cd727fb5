//! Object storage collaborator for skinscan.
//!
//! The [`ObjectStore`] trait is the only thing the pipeline sees. Two backends
//! implement it:
//! - [`RestObjectStore`]: Supabase-compatible storage REST API
//! - [`LocalObjectStore`]: a local directory served by a static file server
//!
//! **Key format:** `{prefix}/{epoch-millis}-{base36-random}.{ext}`, built by
//! [`object_key`]. Keys must not contain `..` or a leading `/`.

pub mod keys;
mod local;
mod rest;

use std::sync::Arc;

use async_trait::async_trait;
use skinscan_shared::{AppConfig, StorageBackend, expand_home, validate_storage_key};
use thiserror::Error;

pub use keys::{object_key, validate_key};
pub use local::LocalObjectStore;
pub use rest::RestObjectStore;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("upload rejected (HTTP {status}): {message}")]
    UploadRejected { status: u16, message: String },

    #[error("object already exists: {0}")]
    AlreadyExists(String),

    #[error("invalid storage key: {0}")]
    InvalidKey(String),

    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Per-upload options.
#[derive(Debug, Clone)]
pub struct UploadOptions {
    /// Media type stored alongside the object.
    pub content_type: String,
    /// Cache lifetime in seconds.
    pub cache_control: String,
    /// Replace an existing object at the same key. The pipeline always sends `false`.
    pub upsert: bool,
}

/// What the backend reports after a successful upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    /// Key inside the bucket.
    pub path: String,
    /// Backend-assigned object id.
    pub id: String,
    /// Bucket-qualified key.
    pub full_path: String,
}

/// Object storage abstraction.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `bytes` at `path` inside `bucket`.
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        options: &UploadOptions,
    ) -> StorageResult<UploadReceipt>;

    /// Publicly dereferenceable URL of an object. Does not check existence.
    fn public_address(&self, bucket: &str, path: &str) -> StorageResult<String>;
}

/// Create the storage backend named in the configuration.
pub async fn create_store(config: &AppConfig) -> StorageResult<Arc<dyn ObjectStore>> {
    match config.storage.backend {
        StorageBackend::Rest => {
            let api_key =
                validate_storage_key(config).map_err(|e| StorageError::Config(e.to_string()))?;
            let store = RestObjectStore::new(&config.storage.endpoint, api_key)?;
            Ok(Arc::new(store))
        }
        StorageBackend::Local => {
            let root = expand_home(&config.storage.local_root);
            let store =
                LocalObjectStore::new(root, config.storage.public_base_url.clone()).await?;
            Ok(Arc::new(store))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn factory_builds_local_backend() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut config = AppConfig::default();
        config.storage.backend = StorageBackend::Local;
        config.storage.local_root = dir.path().to_string_lossy().to_string();
        config.storage.public_base_url = "http://cdn.test".into();

        let store = create_store(&config).await.expect("local store");
        let address = store
            .public_address("skin_image", "uploads/a.png")
            .expect("address");
        assert_eq!(address, "http://cdn.test/skin_image/uploads/a.png");
    }

    #[tokio::test]
    async fn factory_requires_key_for_rest_backend() {
        let mut config = AppConfig::default();
        config.storage.api_key_env = "SKINSCAN_TEST_MISSING_STORAGE_KEY_987".into();

        let err = create_store(&config).await.err().expect("missing key");
        assert!(matches!(err, StorageError::Config(_)));
    }
}
