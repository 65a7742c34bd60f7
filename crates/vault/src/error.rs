use reposync_core::error::CoreError;
use reposync_core::lock::LockError;
use reposync_core::storage::StorageError;
use reposync_db::DbError;

use crate::config::ConfigError;

/// Error type for service callers.
///
/// Lock errors are returned as-is and never retried; validation findings
/// are not errors and travel in the upload outcome instead.
#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Lock(#[from] LockError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Database error: {0}")]
    Db(#[from] DbError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type VaultResult<T> = Result<T, VaultError>;

impl From<sqlx::Error> for VaultError {
    fn from(err: sqlx::Error) -> Self {
        Self::Db(err.into())
    }
}

impl VaultError {
    pub(crate) fn not_found(entity: &'static str, id: reposync_core::types::DbId) -> Self {
        Self::Core(CoreError::NotFound { entity, id })
    }
}
