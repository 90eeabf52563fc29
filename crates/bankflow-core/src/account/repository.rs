//! Account data store trait.

use super::model::StorageKey;
use crate::error::Result;
use async_trait::async_trait;
use serde_json::Value;

/// Keyed storage for downloaded account payloads.
///
/// Writes overwrite whatever is stored under the same key; nothing is merged or
/// versioned. A value read back must equal the value written.
#[async_trait]
pub trait AccountDataStore: Send + Sync {
    /// Stores `payload` under `key`, replacing any previous value.
    async fn write(&self, key: &StorageKey, payload: &Value) -> Result<()>;

    /// Loads the payload stored under `key`.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(Value))`: Payload found
    /// - `Ok(None)`: Nothing stored under the key
    /// - `Err(_)`: Error occurred during retrieval
    async fn read(&self, key: &StorageKey) -> Result<Option<Value>>;
}
