//! Version entity model and DTOs.

use reposync_core::status::ValidationStatus;
use reposync_core::types::{DbId, Timestamp};
use reposync_core::validation::ValidationResult;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::types::Json;
use sqlx::{FromRow, Row};

/// One immutable upload of a document.
///
/// Everything except the validation outcome is fixed at insert; the outcome
/// is attached exactly once afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Version {
    pub id: DbId,
    pub document_id: DbId,
    pub version_number: i32,
    pub storage_key: String,
    pub file_size_bytes: i64,
    /// SHA-256 of the content, lowercase hex.
    pub content_hash: String,
    pub commit_message: String,
    pub uploaded_by: DbId,
    pub created_at: Timestamp,
    pub validation: Option<ValidationResult>,
    pub validated_at: Option<Timestamp>,
}

impl Version {
    pub fn validation_status(&self) -> ValidationStatus {
        match &self.validation {
            None => ValidationStatus::Pending,
            Some(result) if result.passed => ValidationStatus::Passed,
            Some(_) => ValidationStatus::Failed,
        }
    }
}

impl<'r> FromRow<'r, SqliteRow> for Version {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let passed: Option<bool> = row.try_get("validation_passed")?;
        let errors = row
            .try_get::<Option<Json<Vec<String>>>, _>("validation_errors")?
            .map(|Json(errors)| errors)
            .unwrap_or_default();
        Ok(Self {
            id: row.try_get("id")?,
            document_id: row.try_get("document_id")?,
            version_number: row.try_get("version_number")?,
            storage_key: row.try_get("storage_key")?,
            file_size_bytes: row.try_get("file_size_bytes")?,
            content_hash: row.try_get("content_hash")?,
            commit_message: row.try_get("commit_message")?,
            uploaded_by: row.try_get("uploaded_by")?,
            created_at: row.try_get("created_at")?,
            validation: passed.map(|passed| ValidationResult { passed, errors }),
            validated_at: row.try_get("validated_at")?,
        })
    }
}

/// DTO for inserting a version.
///
/// `version_number` must be the document's next number; the repository
/// rejects anything else so numbering stays dense.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateVersion {
    pub document_id: DbId,
    pub version_number: i32,
    pub storage_key: String,
    pub file_size_bytes: i64,
    pub content_hash: String,
    pub commit_message: String,
    pub uploaded_by: DbId,
    pub created_at: Timestamp,
}
