//! Repository for the `versions` table.

use reposync_core::types::{DbId, Timestamp};
use reposync_core::validation::ValidationResult;
use sqlx::types::Json;
use sqlx::{Sqlite, Transaction};

use crate::error::DbError;
use crate::models::version::{CreateVersion, Version};
use crate::DbPool;

const ENTITY: &str = "Version";

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, document_id, version_number, storage_key, file_size_bytes, \
    content_hash, commit_message, uploaded_by, created_at, validation_passed, \
    validation_errors, validated_at";

/// Versions are insert-only apart from the one-time validation outcome.
pub struct VersionRepo;

impl VersionRepo {
    // ── Standard CRUD ────────────────────────────────────────────────

    /// Insert a version.
    ///
    /// The insert only happens if `input.version_number` is exactly one past
    /// the document's current count, checked in the same statement; anything
    /// else, a taken storage key or a missing document is a
    /// [`DbError::Constraint`].
    pub async fn create(pool: &DbPool, input: &CreateVersion) -> Result<Version, DbError> {
        let query = format!(
            "INSERT INTO versions
                (document_id, version_number, storage_key, file_size_bytes, content_hash,
                 commit_message, uploaded_by, created_at)
             SELECT ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8
             WHERE (SELECT COUNT(*) FROM versions WHERE document_id = ?1) = ?2 - 1
             RETURNING {COLUMNS}"
        );
        let inserted = sqlx::query_as::<_, Version>(&query)
            .bind(input.document_id)
            .bind(input.version_number)
            .bind(&input.storage_key)
            .bind(input.file_size_bytes)
            .bind(&input.content_hash)
            .bind(&input.commit_message)
            .bind(input.uploaded_by)
            .bind(input.created_at)
            .fetch_optional(pool)
            .await?;

        let Some(version) = inserted else {
            return Err(DbError::Constraint(format!(
                "document {} is not at version {}",
                input.document_id,
                input.version_number - 1
            )));
        };
        tracing::debug!(
            document_id = version.document_id,
            version_number = version.version_number,
            storage_key = %version.storage_key,
            "Version created",
        );
        Ok(version)
    }

    pub async fn find_by_id(pool: &DbPool, id: DbId) -> Result<Option<Version>, DbError> {
        let query = format!("SELECT {COLUMNS} FROM versions WHERE id = ?1");
        Ok(sqlx::query_as::<_, Version>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?)
    }

    /// All versions of a document, newest first.
    pub async fn list_by_document(pool: &DbPool, document_id: DbId) -> Result<Vec<Version>, DbError> {
        let query = format!(
            "SELECT {COLUMNS} FROM versions
             WHERE document_id = ?1
             ORDER BY version_number DESC"
        );
        Ok(sqlx::query_as::<_, Version>(&query)
            .bind(document_id)
            .fetch_all(pool)
            .await?)
    }

    // ── Version-specific operations ──────────────────────────────────

    pub async fn count_for_document(pool: &DbPool, document_id: DbId) -> Result<usize, DbError> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM versions WHERE document_id = ?1")
            .bind(document_id)
            .fetch_one(pool)
            .await?;
        Ok(row.0 as usize)
    }

    /// Next version number for a document (count + 1).
    pub async fn next_version_number(pool: &DbPool, document_id: DbId) -> Result<i32, DbError> {
        Ok(Self::count_for_document(pool, document_id).await? as i32 + 1)
    }

    /// Highest-numbered version of a document.
    pub async fn find_latest(pool: &DbPool, document_id: DbId) -> Result<Option<Version>, DbError> {
        let query = format!(
            "SELECT {COLUMNS} FROM versions
             WHERE document_id = ?1
             ORDER BY version_number DESC
             LIMIT 1"
        );
        Ok(sqlx::query_as::<_, Version>(&query)
            .bind(document_id)
            .fetch_optional(pool)
            .await?)
    }

    /// Attach the validation outcome. Fails if one is already attached.
    pub async fn record_validation(
        pool: &DbPool,
        id: DbId,
        result: &ValidationResult,
        validated_at: Timestamp,
    ) -> Result<Version, DbError> {
        let mut tx = pool.begin().await?;
        let version = Self::record_validation_in_tx(&mut tx, id, result, validated_at).await?;
        tx.commit().await?;
        Ok(version)
    }

    /// [`Self::record_validation`] inside an open transaction.
    ///
    /// Issued first in the promotion transaction so the transaction holds
    /// the write lock before it reads anything.
    pub async fn record_validation_in_tx(
        tx: &mut Transaction<'_, Sqlite>,
        id: DbId,
        result: &ValidationResult,
        validated_at: Timestamp,
    ) -> Result<Version, DbError> {
        let query = format!(
            "UPDATE versions SET
                validation_passed = ?2,
                validation_errors = ?3,
                validated_at = ?4
             WHERE id = ?1 AND validation_passed IS NULL
             RETURNING {COLUMNS}"
        );
        let updated = sqlx::query_as::<_, Version>(&query)
            .bind(id)
            .bind(result.passed)
            .bind(Json(&result.errors))
            .bind(validated_at)
            .fetch_optional(&mut **tx)
            .await?;
        if let Some(version) = updated {
            return Ok(version);
        }

        let exists: Option<(i64,)> = sqlx::query_as("SELECT id FROM versions WHERE id = ?1")
            .bind(id)
            .fetch_optional(&mut **tx)
            .await?;
        match exists {
            Some(_) => Err(DbError::Constraint(format!(
                "version {id} already has a validation result"
            ))),
            None => Err(DbError::NotFound { entity: ENTITY, id }),
        }
    }

    /// Find a version inside an open transaction.
    pub async fn find_in_tx(
        tx: &mut Transaction<'_, Sqlite>,
        id: DbId,
    ) -> Result<Option<Version>, DbError> {
        let query = format!("SELECT {COLUMNS} FROM versions WHERE id = ?1");
        Ok(sqlx::query_as::<_, Version>(&query)
            .bind(id)
            .fetch_optional(&mut **tx)
            .await?)
    }
}
