//! Local filesystem backend.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::keys::validate_key;
use crate::{ObjectStore, StorageError, StorageResult, UploadOptions, UploadReceipt};

/// Stores objects under `{root}/{bucket}/{path}` and serves them from
/// `{public_base_url}/{bucket}/{path}`.
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
    public_base_url: String,
}

impl LocalObjectStore {
    /// Create the root directory if needed.
    pub async fn new(root: impl Into<PathBuf>, public_base_url: String) -> StorageResult<Self> {
        let root = root.into();

        fs::create_dir_all(&root).await.map_err(|e| {
            StorageError::Config(format!(
                "failed to create storage directory {}: {e}",
                root.display()
            ))
        })?;

        Ok(Self {
            root,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        })
    }

    fn object_path(&self, bucket: &str, path: &str) -> StorageResult<PathBuf> {
        validate_key(bucket)?;
        validate_key(path)?;
        Ok(self.root.join(bucket).join(path))
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        options: &UploadOptions,
    ) -> StorageResult<UploadReceipt> {
        let target = self.object_path(bucket, path)?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut open = fs::OpenOptions::new();
        open.write(true);
        if options.upsert {
            open.create(true).truncate(true);
        } else {
            open.create_new(true);
        }

        let mut file = open.open(&target).await.map_err(|e| match e.kind() {
            ErrorKind::AlreadyExists => StorageError::AlreadyExists(format!("{bucket}/{path}")),
            _ => StorageError::Io(e),
        })?;
        write_or_discard(&mut file, &bytes, &target).await?;

        debug!(path = %target.display(), len = bytes.len(), "stored object locally");

        Ok(UploadReceipt {
            path: path.to_string(),
            id: Uuid::new_v4().to_string(),
            full_path: format!("{bucket}/{path}"),
        })
    }

    fn public_address(&self, bucket: &str, path: &str) -> StorageResult<String> {
        validate_key(bucket)?;
        validate_key(path)?;
        Ok(format!("{}/{bucket}/{path}", self.public_base_url))
    }
}

/// Write `bytes` through `writer`. On failure the partial object at
/// `target` is removed so the key stays free.
async fn write_or_discard<W>(writer: &mut W, bytes: &[u8], target: &Path) -> StorageResult<()>
where
    W: AsyncWrite + Unpin,
{
    let mut written = writer.write_all(bytes).await;
    if written.is_ok() {
        written = writer.flush().await;
    }

    if let Err(e) = written {
        if let Err(cleanup) = fs::remove_file(target).await {
            warn!(path = %target.display(), error = %cleanup, "failed to remove partial object");
        }
        return Err(StorageError::Io(e));
    }
    Ok(())
}
