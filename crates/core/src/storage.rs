//! Blob storage seam for version content.
//!
//! Implementations live in `reposync-storage`; the service layer is generic
//! over [`StorageProvider`] so tests can swap in memory or failing backends.

use std::future::Future;

/// Storage failures. A failed write aborts version creation.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Failed to write '{key}': {reason}")]
    WriteFailure { key: String, reason: String },

    #[error("Stored object not found: {0}")]
    NotFound(String),

    #[error("Failed to read '{key}': {reason}")]
    ReadFailure { key: String, reason: String },

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),
}

/// Key/value blob store addressed by storage keys.
pub trait StorageProvider: Send + Sync {
    /// Short identifier used in logs (`"local"`, `"memory"`).
    fn name(&self) -> &'static str;

    /// Store `content` under a new `key`. Objects are write-once: an
    /// existing key is a [`StorageError::WriteFailure`].
    fn put(
        &self,
        key: &str,
        content: &[u8],
    ) -> impl Future<Output = Result<(), StorageError>> + Send;

    /// Fetch the bytes stored under `key`.
    fn get(&self, key: &str) -> impl Future<Output = Result<Vec<u8>, StorageError>> + Send;

    fn exists(&self, key: &str) -> impl Future<Output = Result<bool, StorageError>> + Send;
}

/// Reject keys that are empty, absolute, or escape their root.
pub fn validate_key(key: &str) -> Result<(), StorageError> {
    let bad = key.is_empty()
        || key.starts_with('/')
        || key.contains('\\')
        || key.split('/').any(|part| part.is_empty() || part == "." || part == "..");
    if bad {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    Ok(())
}
