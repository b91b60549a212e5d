//! # Key-Value Store Contract
//!
//! The asynchronous get/set interface the cart persists through.

use async_trait::async_trait;

use crate::error::StorageResult;

/// An asynchronous string key-value store.
///
/// All methods take `&self`; implementations use interior mutability so one
/// instance can be shared as `Arc<dyn KeyValueStore>` between the hydration
/// read and the background writer.
///
/// ## Failure Semantics
/// Any method may fail (disk, pool, injected fault). Callers in this
/// workspace never let such a failure reach the UI: a failed `get` during
/// hydration counts as "absent", a failed `set` is retried and then logged.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Reads a value. `Ok(None)` if the key was never written.
    async fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Inserts or replaces a value.
    async fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Deletes a value. Succeeds if the key did not exist.
    async fn remove(&self, key: &str) -> StorageResult<()>;
}
