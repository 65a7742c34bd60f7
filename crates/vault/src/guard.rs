//! Per-document critical sections.
//!
//! Lock transitions, the lock-check/count/insert of a new version and the
//! promotion of a validated version hold the document's guard, so they are
//! serialized per document and never across documents. The registry is
//! process-local: one service process owns a database.

use std::collections::HashMap;
use std::sync::Arc;

use reposync_core::types::DbId;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Held for the duration of a per-document critical section.
pub type DocumentGuard = OwnedMutexGuard<()>;

#[derive(Debug, Default)]
pub struct DocumentGuards {
    slots: Mutex<HashMap<DbId, Arc<Mutex<()>>>>,
}

impl DocumentGuards {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter the critical section for `document_id`.
    pub async fn enter(&self, document_id: DbId) -> DocumentGuard {
        let slot = {
            let mut slots = self.slots.lock().await;
            Arc::clone(slots.entry(document_id).or_default())
        };
        slot.lock_owned().await
    }
}
