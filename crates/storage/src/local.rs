//! Local filesystem storage rooted at a configured directory.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use reposync_core::storage::{validate_key, StorageError, StorageProvider};
use tokio::io::AsyncWriteExt;

#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn full_path(&self, key: &str) -> Result<PathBuf, StorageError> {
        validate_key(key)?;
        Ok(self.root.join(key))
    }
}

impl StorageProvider for LocalStorage {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn put(&self, key: &str, content: &[u8]) -> Result<(), StorageError> {
        let path = self.full_path(key)?;
        let write_failure = |e: std::io::Error| StorageError::WriteFailure {
            key: key.to_string(),
            reason: e.to_string(),
        };

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(write_failure)?;
        }
        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(write_failure)?;
        let written = async {
            file.write_all(content).await?;
            file.sync_all().await
        }
        .await;
        if let Err(e) = written {
            // Never leave a truncated object behind under a valid key.
            let _ = tokio::fs::remove_file(&path).await;
            return Err(write_failure(e));
        }
        tracing::debug!(key, bytes = content.len(), "Stored object");
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.full_path(key)?;
        tokio::fs::read(&path).await.map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                StorageError::NotFound(key.to_string())
            } else {
                StorageError::ReadFailure {
                    key: key.to_string(),
                    reason: e.to_string(),
                }
            }
        })
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        let path = self.full_path(key)?;
        tokio::fs::try_exists(&path)
            .await
            .map_err(|e| StorageError::ReadFailure {
                key: key.to_string(),
                reason: e.to_string(),
            })
    }
}
