//! Single-writer checkout/checkin.
//!
//! Each transition runs inside the document's critical section so the lock
//! read, the state machine step and the write are one atomic unit.

use std::sync::Arc;

use chrono::Utc;
use reposync_core::types::{DbId, Timestamp};
use reposync_db::models::document::Document;
use reposync_db::repositories::DocumentRepo;
use reposync_db::DbPool;

use crate::error::{VaultError, VaultResult};
use crate::guard::DocumentGuards;

#[derive(Clone)]
pub struct CheckoutLock {
    pool: DbPool,
    guards: Arc<DocumentGuards>,
}

impl CheckoutLock {
    pub fn new(pool: DbPool, guards: Arc<DocumentGuards>) -> Self {
        Self { pool, guards }
    }

    /// Check the document out to `holder`.
    ///
    /// Fails with `AlreadyLocked` while anyone, `holder` included, has it.
    pub async fn acquire(&self, document_id: DbId, holder: DbId) -> VaultResult<Document> {
        let _guard = self.guards.enter(document_id).await;
        let doc = self.load(document_id).await?;

        let next = doc.lock.acquire(holder, Utc::now())?;
        let doc = DocumentRepo::set_lock(&self.pool, document_id, next).await?;
        tracing::info!(document_id, holder, "Document checked out");
        Ok(doc)
    }

    /// Check the document back in.
    ///
    /// Fails with `NotLockHolder` unless `holder` has it checked out.
    pub async fn release(&self, document_id: DbId, holder: DbId) -> VaultResult<Document> {
        let _guard = self.guards.enter(document_id).await;
        let doc = self.load(document_id).await?;

        let next = doc.lock.release(holder)?;
        let doc = DocumentRepo::set_lock(&self.pool, document_id, next).await?;
        tracing::info!(document_id, holder, "Document checked in");
        Ok(doc)
    }

    /// Current holder and when they checked the document out.
    pub async fn holder(&self, document_id: DbId) -> VaultResult<Option<(DbId, Timestamp)>> {
        let doc = self.load(document_id).await?;
        Ok(doc.lock.holder().zip(doc.lock.acquired_at()))
    }

    async fn load(&self, document_id: DbId) -> VaultResult<Document> {
        DocumentRepo::find_by_id(&self.pool, document_id)
            .await?
            .ok_or_else(|| VaultError::not_found("Document", document_id))
    }
}
