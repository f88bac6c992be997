//! Key-value store abstraction.

use async_trait::async_trait;

use crate::error::StorageResult;

/// Asynchronous string key-value store.
///
/// Values are opaque strings; callers serialize structured data themselves.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a value. Missing keys are `Ok(None)`.
    async fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Insert or replace a value.
    async fn set(&self, key: &str, value: String) -> StorageResult<()>;

    /// Delete a value. Deleting a missing key is not an error.
    async fn remove(&self, key: &str) -> StorageResult<()>;

    /// Delete every value.
    async fn clear(&self) -> StorageResult<()>;
}
