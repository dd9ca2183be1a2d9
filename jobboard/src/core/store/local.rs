use super::{KvStore, MemoryStore, WindowBatch};
use crate::core::StoreError;
use crate::core::clock::{SharedClock, SystemClock};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

/// [`KvStore`] backed by a mutex-guarded [`MemoryStore`]
///
/// Each call holds the lock for exactly one operation, which gives window
/// batches the same all-or-nothing behavior a Redis `MULTI/EXEC` provides.
/// Only coordinates requests inside a single process.
///
/// # Example
///
/// ```
/// use jobboard::{KvStore, LocalStore};
/// use std::time::Duration;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let store = LocalStore::default();
/// assert_eq!(store.incr("vacancy_version").await.unwrap(), 1);
/// assert_eq!(store.incr("vacancy_version").await.unwrap(), 2);
/// # }
/// ```
#[derive(Clone)]
pub struct LocalStore {
    inner: Arc<Mutex<MemoryStore>>,
    clock: SharedClock,
}

impl LocalStore {
    pub fn new(store: MemoryStore, clock: SharedClock) -> Self {
        Self {
            inner: Arc::new(Mutex::new(store)),
            clock,
        }
    }

    /// Default-sized store reading time from `clock`
    pub fn with_clock(clock: SharedClock) -> Self {
        Self::new(MemoryStore::new(), clock)
    }

    /// Run a closure against the underlying store, e.g. to inspect TTLs in tests
    pub fn inspect<R>(&self, f: impl FnOnce(&MemoryStore, std::time::SystemTime) -> R) -> R {
        let store = self.inner.lock();
        f(&store, self.clock.now())
    }
}

impl Default for LocalStore {
    fn default() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }
}

#[async_trait]
impl KvStore for LocalStore {
    async fn window_batch(&self, batch: &WindowBatch) -> Result<u64, StoreError> {
        let now = self.clock.now();
        self.inner.lock().window_batch(batch, now)
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let now = self.clock.now();
        self.inner.lock().get(key, now)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        let now = self.clock.now();
        self.inner.lock().set(key, value, ttl, now);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let now = self.clock.now();
        Ok(self.inner.lock().delete(key, now))
    }

    async fn incr(&self, key: &str) -> Result<i64, StoreError> {
        let now = self.clock.now();
        self.inner.lock().incr(key, now)
    }
}
