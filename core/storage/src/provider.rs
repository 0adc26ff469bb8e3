//! Store trait definition.

use async_trait::async_trait;

use pagelock_common::Result;

/// A string-to-string store with per-key atomic writes.
///
/// Mirrors the semantics of a browser's `localStorage`: a missing key reads
/// as `None` and removing it is a no-op.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Get the store name (e.g., "memory", "local").
    fn name(&self) -> &str;

    /// Read the value stored under `key`.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: String) -> Result<()>;

    /// Remove `key`. Succeeds if the key does not exist.
    async fn remove(&self, key: &str) -> Result<()>;

    /// Check if a key exists.
    async fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.get(key).await?.is_some())
    }
}
