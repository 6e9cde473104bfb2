use anyhow::Context;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Remote store failure classes. Transient errors are retried with backoff;
/// permanent errors (bad credentials, missing source) fail the upload fast.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("transient store error: {0}")]
    Transient(String),

    #[error("permanent store error: {0}")]
    Permanent(String),
}

impl StoreError {
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Transient(_))
    }
}

/// Remote object storage.
///
/// `put` must be safe to repeat for the same key: resubmitting an upload
/// after a crash overwrites the object rather than duplicating it.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put(&self, local_path: &Path, key: &str) -> Result<(), StoreError>;
}

/// Directory-backed object store.
///
/// Stages the object through a temp file and renames it into place, so a
/// crashed upload never leaves a visible partial object. S3/Azure backends
/// plug in behind [`ObjectStore`] the same way.
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)
            .with_context(|| format!("Failed to create store root: {:?}", root))?;
        Ok(Self { root })
    }

    /// Where a given key lands on disk.
    pub fn object_path(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    async fn put(&self, local_path: &Path, key: &str) -> Result<(), StoreError> {
        let dest = self.object_path(key);
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::Transient(format!("create {:?}: {}", parent, e)))?;
        }

        let staging = dest.with_extension("part");
        tokio::fs::copy(local_path, &staging)
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => {
                    StoreError::Permanent(format!("source {:?} missing: {}", local_path, e))
                }
                _ => StoreError::Transient(format!("copy to {:?}: {}", staging, e)),
            })?;

        tokio::fs::rename(&staging, &dest)
            .await
            .map_err(|e| StoreError::Transient(format!("rename into {:?}: {}", dest, e)))?;

        debug!("Stored object {:?}", dest);
        Ok(())
    }
}
