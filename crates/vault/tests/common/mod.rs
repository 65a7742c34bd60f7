//! Shared helpers for vault integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use reposync_core::fixtures::{SheetFixture, WorkbookFixture};
use reposync_core::storage::{StorageError, StorageProvider};
use reposync_db::models::collection::CreateCollection;
use reposync_db::DbPool;
use reposync_events::EventBus;
use reposync_storage::MemoryStorage;
use reposync_vault::{DocumentService, VaultConfig};
use serde_json::json;

pub const ALICE: i64 = 1;
pub const BOB: i64 = 2;

pub struct Harness<S> {
    pub pool: DbPool,
    pub storage: Arc<S>,
    pub events: Arc<EventBus>,
    pub service: DocumentService<S>,
}

/// Service over `pool` (a migrated test database) and in-memory storage.
pub fn harness(pool: DbPool) -> Harness<MemoryStorage> {
    harness_with(pool, MemoryStorage::new(), VaultConfig::default())
}

pub fn harness_with<S: StorageProvider>(pool: DbPool, storage: S, config: VaultConfig) -> Harness<S> {
    let storage = Arc::new(storage);
    let events = Arc::new(EventBus::default());
    let service = DocumentService::new(pool.clone(), Arc::clone(&storage), Arc::clone(&events), config);
    Harness {
        pool,
        storage,
        events,
        service,
    }
}

/// `Data` sheet with `ID`/`Value` headers and `Data!B:B` limited to 0..=100.
pub fn finance_rules() -> serde_json::Value {
    json!({
        "required_sheets": ["Data"],
        "required_columns": {"Data": ["ID", "Value"]},
        "data_validations": {"Data!B:B": {"type": "range", "min": 0, "max": 100}}
    })
}

pub async fn finance_collection<S: StorageProvider>(h: &Harness<S>) -> i64 {
    let collection = h
        .service
        .create_collection(&CreateCollection {
            name: "Finance".into(),
            description: Some("Quarterly numbers".into()),
            created_by: ALICE,
            rules: None,
        })
        .await
        .unwrap();
    h.service
        .update_collection_rules(collection.id, ALICE, &finance_rules())
        .await
        .unwrap();
    collection.id
}

/// Workbook with one `Value` row.
pub fn workbook_with_value(value: f64) -> Vec<u8> {
    WorkbookFixture::new()
        .sheet(
            SheetFixture::new("Data")
                .header(&["ID", "Value"])
                .number("A2", 1.0)
                .number("B2", value),
        )
        .build()
}

pub fn passing_workbook() -> Vec<u8> {
    workbook_with_value(50.0)
}

pub fn failing_workbook() -> Vec<u8> {
    workbook_with_value(150.0)
}

/// Storage whose writes always fail.
#[derive(Debug, Default)]
pub struct FailingStorage;

impl StorageProvider for FailingStorage {
    fn name(&self) -> &'static str {
        "failing"
    }

    async fn put(&self, key: &str, _content: &[u8]) -> Result<(), StorageError> {
        Err(StorageError::WriteFailure {
            key: key.to_string(),
            reason: "disk full".into(),
        })
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        Err(StorageError::NotFound(key.to_string()))
    }

    async fn exists(&self, _key: &str) -> Result<bool, StorageError> {
        Ok(false)
    }
}

/// Storage that accepts writes but can no longer read them back.
#[derive(Debug, Default)]
pub struct UnreadableStorage {
    inner: MemoryStorage,
}

impl StorageProvider for UnreadableStorage {
    fn name(&self) -> &'static str {
        "unreadable"
    }

    async fn put(&self, key: &str, content: &[u8]) -> Result<(), StorageError> {
        self.inner.put(key, content).await
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        Err(StorageError::ReadFailure {
            key: key.to_string(),
            reason: "device unavailable".into(),
        })
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        self.inner.exists(key).await
    }
}
