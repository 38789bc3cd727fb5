//! Blob publisher: upload validated bytes and resolve their public address.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use skinscan_shared::{PublishConfig, PublishError, SourceFile, StoredObject};
use skinscan_storage::{ObjectStore, StorageError, UploadOptions, object_key};

/// Uploads images into the configured bucket. Never retries.
pub struct BlobPublisher {
    store: Arc<dyn ObjectStore>,
    config: PublishConfig,
}

impl BlobPublisher {
    pub fn new(store: Arc<dyn ObjectStore>, config: PublishConfig) -> Self {
        Self { store, config }
    }

    /// Upload `file` under a fresh key and resolve its public address.
    ///
    /// Takes the file by value: from here on the bytes belong to storage.
    #[instrument(skip_all, fields(file = %file.name, bucket = %self.config.bucket))]
    pub async fn publish(&self, file: SourceFile) -> Result<StoredObject, PublishError> {
        let path = object_key(&self.config.prefix, &file.name, &file.media_type);
        let options = UploadOptions {
            content_type: file.media_type.clone(),
            cache_control: self.config.cache_control.clone(),
            upsert: false,
        };

        let receipt = self
            .store
            .upload(&self.config.bucket, &path, file.bytes, &options)
            .await
            .map_err(rejected)?;

        let public_address = self
            .store
            .public_address(&self.config.bucket, &receipt.path)
            .map_err(rejected)?;

        if public_address.trim().is_empty() {
            warn!(path = %receipt.path, "storage resolved an empty public address");
            return Err(PublishError::StorageRejected(
                "storage resolved an empty public address".into(),
            ));
        }

        info!(path = %receipt.path, %public_address, "image published");

        Ok(StoredObject {
            storage_id: receipt.id,
            storage_path: receipt.path,
            full_path: receipt.full_path,
            public_address,
        })
    }
}

fn rejected(err: StorageError) -> PublishError {
    warn!(error = %err, "storage rejected upload");
    PublishError::StorageRejected(err.to_string())
}
