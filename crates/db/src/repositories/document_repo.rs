//! Repository for the `documents` table.

use chrono::Utc;
use reposync_core::lock::LockState;
use reposync_core::rule_set::RuleSet;
use reposync_core::types::DbId;
use sqlx::types::Json;
use sqlx::{Sqlite, Transaction};

use crate::error::DbError;
use crate::models::document::{CreateDocument, Document};
use crate::DbPool;

const ENTITY: &str = "Document";

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, collection_id, filename, locked_by, locked_at, current_version_id, \
    rules_override, created_by, created_at, updated_at";

/// Provides CRUD and lock/pointer updates for documents.
///
/// The mutating methods here are plain writes; callers that need
/// read-check-write semantics serialize per document themselves.
pub struct DocumentRepo;

impl DocumentRepo {
    /// Insert a new, unlocked document with no current version.
    pub async fn create(pool: &DbPool, input: &CreateDocument) -> Result<Document, DbError> {
        let query = format!(
            "INSERT INTO documents (collection_id, filename, created_by, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)
             RETURNING {COLUMNS}"
        );
        let document = sqlx::query_as::<_, Document>(&query)
            .bind(input.collection_id)
            .bind(&input.filename)
            .bind(input.created_by)
            .bind(Utc::now())
            .fetch_one(pool)
            .await?;
        tracing::debug!(
            document_id = document.id,
            collection_id = document.collection_id,
            filename = %document.filename,
            "Document created",
        );
        Ok(document)
    }

    pub async fn find_by_id(pool: &DbPool, id: DbId) -> Result<Option<Document>, DbError> {
        let query = format!("SELECT {COLUMNS} FROM documents WHERE id = ?1");
        Ok(sqlx::query_as::<_, Document>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?)
    }

    /// Documents of one collection ordered by filename.
    pub async fn list_by_collection(
        pool: &DbPool,
        collection_id: DbId,
    ) -> Result<Vec<Document>, DbError> {
        let query = format!(
            "SELECT {COLUMNS} FROM documents WHERE collection_id = ?1 ORDER BY filename, id"
        );
        Ok(sqlx::query_as::<_, Document>(&query)
            .bind(collection_id)
            .fetch_all(pool)
            .await?)
    }

    /// Replace the lock state.
    pub async fn set_lock(pool: &DbPool, id: DbId, lock: LockState) -> Result<Document, DbError> {
        let mut conn = pool.acquire().await?;
        Self::write_lock(&mut conn, id, lock).await
    }

    /// Point the document at one of its own versions.
    pub async fn set_current_version(
        pool: &DbPool,
        id: DbId,
        version_id: DbId,
    ) -> Result<Document, DbError> {
        let mut conn = pool.acquire().await?;
        Self::write_current_version(&mut conn, id, version_id).await
    }

    /// Set or clear the per-document rule set override.
    pub async fn set_rules_override(
        pool: &DbPool,
        id: DbId,
        rules: Option<RuleSet>,
    ) -> Result<Document, DbError> {
        let query = format!(
            "UPDATE documents SET rules_override = ?2, updated_at = ?3
             WHERE id = ?1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Document>(&query)
            .bind(id)
            .bind(rules.as_ref().map(Json))
            .bind(Utc::now())
            .fetch_optional(pool)
            .await?
            .ok_or(DbError::NotFound { entity: ENTITY, id })
    }

    /// Delete a document that never received a version. Returns `true` if a
    /// row was removed; documents with versions are never deleted.
    pub async fn delete_if_empty(pool: &DbPool, id: DbId) -> Result<bool, DbError> {
        let result = sqlx::query(
            "DELETE FROM documents
             WHERE id = ?1 AND NOT EXISTS (SELECT 1 FROM versions WHERE document_id = ?1)",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    // ── Transaction-scoped writes ────────────────────────────────────

    /// Load a document inside an open transaction.
    pub async fn find_in_tx(
        tx: &mut Transaction<'_, Sqlite>,
        id: DbId,
    ) -> Result<Document, DbError> {
        let query = format!("SELECT {COLUMNS} FROM documents WHERE id = ?1");
        sqlx::query_as::<_, Document>(&query)
            .bind(id)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or(DbError::NotFound { entity: ENTITY, id })
    }

    /// [`Self::set_lock`] inside an open transaction.
    pub async fn set_lock_in_tx(
        tx: &mut Transaction<'_, Sqlite>,
        id: DbId,
        lock: LockState,
    ) -> Result<Document, DbError> {
        Self::write_lock(tx, id, lock).await
    }

    /// [`Self::set_current_version`] inside an open transaction.
    pub async fn set_current_version_in_tx(
        tx: &mut Transaction<'_, Sqlite>,
        id: DbId,
        version_id: DbId,
    ) -> Result<Document, DbError> {
        Self::write_current_version(tx, id, version_id).await
    }

    async fn write_lock(
        conn: &mut sqlx::SqliteConnection,
        id: DbId,
        lock: LockState,
    ) -> Result<Document, DbError> {
        let query = format!(
            "UPDATE documents SET locked_by = ?2, locked_at = ?3, updated_at = ?4
             WHERE id = ?1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Document>(&query)
            .bind(id)
            .bind(lock.holder())
            .bind(lock.acquired_at())
            .bind(Utc::now())
            .fetch_optional(&mut *conn)
            .await?
            .ok_or(DbError::NotFound { entity: ENTITY, id })
    }

    async fn write_current_version(
        conn: &mut sqlx::SqliteConnection,
        id: DbId,
        version_id: DbId,
    ) -> Result<Document, DbError> {
        let query = format!(
            "UPDATE documents SET current_version_id = ?2, updated_at = ?3
             WHERE id = ?1
               AND EXISTS (SELECT 1 FROM versions WHERE id = ?2 AND document_id = ?1)
             RETURNING {COLUMNS}"
        );
        let updated = sqlx::query_as::<_, Document>(&query)
            .bind(id)
            .bind(version_id)
            .bind(Utc::now())
            .fetch_optional(&mut *conn)
            .await?;
        match updated {
            Some(document) => Ok(document),
            None => Err(DbError::Constraint(format!(
                "version {version_id} does not belong to document {id}"
            ))),
        }
    }
}
