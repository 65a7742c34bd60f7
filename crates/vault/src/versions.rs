//! Version creation and promotion.
//!
//! Numbering is `1 + existing count`, computed together with the lock check
//! and the insert under the document's critical section, so concurrent
//! uploads get dense, unique numbers; the insert itself re-checks the count.
//! Validation happens between [`VersionStore::create_version`] and
//! [`VersionStore::promote`], outside the critical section. Promotion is one
//! transaction.

use std::sync::Arc;

use chrono::Utc;
use reposync_core::hashing::{content_digest, matches_digest};
use reposync_core::naming::storage_key;
use reposync_core::storage::{StorageError, StorageProvider};
use reposync_core::types::DbId;
use reposync_core::upload::validate_commit_message;
use reposync_core::validation::ValidationResult;
use reposync_db::models::document::Document;
use reposync_db::models::version::{CreateVersion, Version};
use reposync_db::repositories::{DocumentRepo, VersionRepo};
use reposync_db::DbPool;

use crate::error::{VaultError, VaultResult};
use crate::guard::DocumentGuards;

/// What [`VersionStore::promote`] changed.
#[derive(Debug, Clone)]
pub struct Promotion {
    /// The document after promotion.
    pub document: Document,
    /// The version with its validation outcome attached.
    pub version: Version,
    /// The version became the document's current version.
    pub promoted: bool,
    /// The uploader's checkout was released.
    pub released: bool,
}

pub struct VersionStore<S> {
    pool: DbPool,
    storage: Arc<S>,
    guards: Arc<DocumentGuards>,
}

impl<S> Clone for VersionStore<S> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            storage: Arc::clone(&self.storage),
            guards: Arc::clone(&self.guards),
        }
    }
}

impl<S: StorageProvider> VersionStore<S> {
    pub fn new(pool: DbPool, storage: Arc<S>, guards: Arc<DocumentGuards>) -> Self {
        Self {
            pool,
            storage,
            guards,
        }
    }

    /// Persist `content` as the document's next version.
    ///
    /// `holder` must have the document checked out, unless the document has
    /// no versions yet, nobody holds it and `holder` created it. `filename`
    /// must already be sanitized. Nothing is recorded if the storage write
    /// fails. The new version is pending and not current.
    pub async fn create_version(
        &self,
        document_id: DbId,
        holder: DbId,
        commit_message: &str,
        filename: &str,
        content: &[u8],
    ) -> VaultResult<Version> {
        validate_commit_message(commit_message)?;

        let _guard = self.guards.enter(document_id).await;
        let doc = DocumentRepo::find_by_id(&self.pool, document_id)
            .await?
            .ok_or_else(|| VaultError::not_found("Document", document_id))?;

        let existing = VersionRepo::count_for_document(&self.pool, document_id).await?;
        doc.lock.permits_write(holder, doc.created_by, existing)?;

        let version_number = existing as i32 + 1;
        let created_at = Utc::now();
        let key = storage_key(document_id, version_number, created_at, filename);

        if let Err(e) = self.storage.put(&key, content).await {
            tracing::warn!(
                document_id,
                version_number,
                backend = self.storage.name(),
                error = %e,
                "Failed to store version content",
            );
            return Err(e.into());
        }

        let version = VersionRepo::create(
            &self.pool,
            &CreateVersion {
                document_id,
                version_number,
                storage_key: key,
                file_size_bytes: content.len() as i64,
                content_hash: content_digest(content),
                commit_message: commit_message.trim().to_string(),
                uploaded_by: holder,
                created_at,
            },
        )
        .await?;

        tracing::info!(
            document_id,
            version_number,
            uploaded_by = holder,
            bytes = content.len(),
            "Version created",
        );
        Ok(version)
    }

    /// Attach `result` to a version and apply its consequences.
    ///
    /// A passed version becomes current unless a newer one already is, and
    /// a passed upload by the lock holder checks the document back in. A
    /// failed version changes nothing but its own record. All writes commit
    /// together or not at all.
    pub async fn promote(&self, version_id: DbId, result: &ValidationResult) -> VaultResult<Promotion> {
        let pending = VersionRepo::find_by_id(&self.pool, version_id)
            .await?
            .ok_or_else(|| VaultError::not_found("Version", version_id))?;
        let document_id = pending.document_id;

        let _guard = self.guards.enter(document_id).await;
        let mut tx = self.pool.begin().await?;

        // Write first so the transaction holds the write lock before reading.
        let version =
            VersionRepo::record_validation_in_tx(&mut tx, version_id, result, Utc::now()).await?;
        let mut document = DocumentRepo::find_in_tx(&mut tx, document_id).await?;

        let mut promoted = false;
        let mut released = false;
        if result.passed {
            let newer = match document.current_version_id {
                None => true,
                Some(current_id) => VersionRepo::find_in_tx(&mut tx, current_id)
                    .await?
                    .map_or(true, |current| version.version_number > current.version_number),
            };
            if newer {
                document =
                    DocumentRepo::set_current_version_in_tx(&mut tx, document_id, version.id)
                        .await?;
                promoted = true;
            }
            if document.lock.is_held_by(version.uploaded_by) {
                let next = document.lock.release(version.uploaded_by)?;
                document = DocumentRepo::set_lock_in_tx(&mut tx, document_id, next).await?;
                released = true;
            }
        }
        tx.commit().await?;

        tracing::info!(
            document_id,
            version_number = version.version_number,
            passed = result.passed,
            errors = result.errors.len(),
            promoted,
            released,
            "Version validated",
        );
        Ok(Promotion {
            document,
            version,
            promoted,
            released,
        })
    }

    /// All versions, newest first.
    pub async fn history(&self, document_id: DbId) -> VaultResult<Vec<Version>> {
        Ok(VersionRepo::list_by_document(&self.pool, document_id).await?)
    }

    pub async fn count(&self, document_id: DbId) -> VaultResult<usize> {
        Ok(VersionRepo::count_for_document(&self.pool, document_id).await?)
    }

    pub async fn latest(&self, document_id: DbId) -> VaultResult<Option<Version>> {
        Ok(VersionRepo::find_latest(&self.pool, document_id).await?)
    }

    /// The document's current version, if any version has passed.
    pub async fn current(&self, document: &Document) -> VaultResult<Option<Version>> {
        match document.current_version_id {
            None => Ok(None),
            Some(id) => Ok(VersionRepo::find_by_id(&self.pool, id).await?),
        }
    }

    /// Stored bytes of a version, checked against the recorded digest.
    pub async fn read(&self, version: &Version) -> VaultResult<Vec<u8>> {
        let content = self.storage.get(&version.storage_key).await?;
        if !matches_digest(&content, &version.content_hash) {
            tracing::error!(
                document_id = version.document_id,
                version_number = version.version_number,
                storage_key = %version.storage_key,
                "Stored content does not match its digest",
            );
            return Err(StorageError::ReadFailure {
                key: version.storage_key.clone(),
                reason: "content digest mismatch".into(),
            }
            .into());
        }
        Ok(content)
    }
}
