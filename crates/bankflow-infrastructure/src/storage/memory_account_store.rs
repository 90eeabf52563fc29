//! In-memory account data store.

use async_trait::async_trait;
use bankflow_core::account::{AccountDataStore, StorageKey};
use bankflow_core::error::Result;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Keeps payloads in a map; useful where nothing should touch the disk.
#[derive(Debug, Default)]
pub struct MemoryAccountDataStore {
    entries: RwLock<HashMap<String, Value>>,
}

impl MemoryAccountDataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// File names currently stored, sorted.
    pub async fn keys(&self) -> Vec<String> {
        let entries = self.entries.read().await;
        let mut keys: Vec<String> = entries.keys().cloned().collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl AccountDataStore for MemoryAccountDataStore {
    async fn write(&self, key: &StorageKey, payload: &Value) -> Result<()> {
        let mut entries = self.entries.write().await;
        entries.insert(key.file_name(), payload.clone());
        Ok(())
    }

    async fn read(&self, key: &StorageKey) -> Result<Option<Value>> {
        let entries = self.entries.read().await;
        Ok(entries.get(&key.file_name()).cloned())
    }
}
