use reposync_core::types::DbId;

/// Repository failures.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: DbId },

    /// A uniqueness, foreign-key or immutability constraint was violated.
    #[error("Constraint violation: {0}")]
    Constraint(String),

    #[error(transparent)]
    Sqlx(sqlx::Error),
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db)
                if db.is_unique_violation()
                    || db.is_foreign_key_violation()
                    || db.is_check_violation() =>
            {
                Self::Constraint(db.message().to_string())
            }
            _ => Self::Sqlx(err),
        }
    }
}
