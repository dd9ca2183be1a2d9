use super::StoreError;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;


mod local;
mod memory;

pub use local::LocalStore;
pub use memory::{MemoryStore, MemoryStoreBuilder};

/// The sliding-window batch: prune, count, insert, expire
///
/// Backends must apply all four steps as one indivisible unit with respect
/// to other batches on the same key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowBatch {
    /// Sorted-set key, e.g. `rate_limiter:/user/sign_in:10.0.0.1`
    pub key: String,
    /// Markers scored strictly below this are removed
    pub prune_before_ms: i64,
    /// Marker inserted unconditionally after counting
    pub member: String,
    /// Score of the inserted marker
    pub score_ms: i64,
    /// Expiry applied to the whole key after the insert
    pub ttl: Duration,
}

/// Shared key-value store contract (similar to the subset of Redis we use)
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Run a [`WindowBatch`] atomically
    ///
    /// Returns the cardinality observed after pruning and before inserting.
    async fn window_batch(&self, batch: &WindowBatch) -> Result<u64, StoreError>;

    /// Get a string value
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Set a string value with TTL
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError>;

    /// Delete a key, returning whether it existed
    async fn delete(&self, key: &str) -> Result<bool, StoreError>;

    /// Atomically increment an integer, treating a missing key as 0
    async fn incr(&self, key: &str) -> Result<i64, StoreError>;
}

#[async_trait]
impl<T: KvStore + ?Sized> KvStore for Arc<T> {
    async fn window_batch(&self, batch: &WindowBatch) -> Result<u64, StoreError> {
        (**self).window_batch(batch).await
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        (**self).set(key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        (**self).delete(key).await
    }

    async fn incr(&self, key: &str) -> Result<i64, StoreError> {
        (**self).incr(key).await
    }
}
