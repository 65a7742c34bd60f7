use crate::types::DbId;

/// Domain errors surfaced to callers of the service layer.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    /// Rejected input: upload admission checks and malformed rule sets.
    #[error("Validation failed: {0}")]
    Validation(String),
}
