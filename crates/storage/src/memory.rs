//! In-process storage for tests and embedders without a disk.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use reposync_core::storage::{validate_key, StorageError, StorageProvider};
use tokio::sync::RwLock;

#[derive(Debug, Default)]
pub struct MemoryStorage {
    objects: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects.
    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }

    /// Stored keys, sorted.
    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.objects.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }
}

impl StorageProvider for MemoryStorage {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn put(&self, key: &str, content: &[u8]) -> Result<(), StorageError> {
        validate_key(key)?;
        match self.objects.write().await.entry(key.to_string()) {
            Entry::Occupied(_) => Err(StorageError::WriteFailure {
                key: key.to_string(),
                reason: "object already exists".into(),
            }),
            Entry::Vacant(slot) => {
                slot.insert(content.to_vec());
                Ok(())
            }
        }
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        self.objects
            .read()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        Ok(self.objects.read().await.contains_key(key))
    }
}
