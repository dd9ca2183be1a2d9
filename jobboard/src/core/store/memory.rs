use super::WindowBatch;
use crate::core::StoreError;
use std::collections::BTreeSet;
use std::time::{Duration, SystemTime};

#[cfg(feature = "ahash")]
use ahash::AHashMap as HashMap;
#[cfg(not(feature = "ahash"))]
use std::collections::HashMap;

// Configuration constants
const DEFAULT_CAPACITY: usize = 1000;
const CAPACITY_OVERHEAD_FACTOR: f64 = 1.3;
const DEFAULT_CLEANUP_INTERVAL_SECS: u64 = 60;

#[derive(Debug)]
enum Value {
    Text(String),
    Window(BTreeSet<(i64, String)>),
}

#[derive(Debug)]
struct Entry {
    value: Value,
    expires_at: Option<SystemTime>,
}

impl Entry {
    /// Redis keeps a key until the clock is strictly past its expiry
    fn is_live(&self, now: SystemTime) -> bool {
        match self.expires_at {
            Some(expiry) => expiry >= now,
            None => true,
        }
    }
}

/// In-process key-value store with Redis-like expiry semantics
///
/// Expired keys are invisible immediately and physically removed at fixed
/// cleanup intervals. Every operation takes the current time explicitly so
/// callers control the clock.
///
/// # Example
///
/// ```
/// use jobboard::MemoryStore;
/// use std::time::{Duration, SystemTime};
///
/// let mut store = MemoryStore::builder()
///     .cleanup_interval(Duration::from_secs(300))
///     .build();
///
/// let now = SystemTime::now();
/// store.set("greeting", "hello", Duration::from_secs(10), now);
/// assert_eq!(store.get("greeting", now).unwrap().as_deref(), Some("hello"));
/// assert_eq!(store.get("greeting", now + Duration::from_secs(10)).unwrap().as_deref(), Some("hello"));
/// assert_eq!(store.get("greeting", now + Duration::from_secs(11)).unwrap(), None);
/// ```
pub struct MemoryStore {
    data: HashMap<String, Entry>,
    // Next sweep deadline, seeded by the first timed write
    next_cleanup: Option<SystemTime>,
    cleanup_interval: Duration,
    // Number of entries dropped by the last cleanup
    expired_count: usize,
}

/// Builder for configuring a MemoryStore
pub struct MemoryStoreBuilder {
    capacity: usize,
    cleanup_interval: Duration,
}

impl MemoryStore {
    /// Create a new MemoryStore with default configuration
    ///
    /// Uses a default capacity of 1000 entries and cleanup interval of 60 seconds.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a new MemoryStore with specified capacity
    ///
    /// The store will allocate 30% more space to reduce hash collisions.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_config(
            capacity,
            Duration::from_secs(DEFAULT_CLEANUP_INTERVAL_SECS),
        )
    }

    pub fn builder() -> MemoryStoreBuilder {
        MemoryStoreBuilder::default()
    }

    fn with_config(capacity: usize, cleanup_interval: Duration) -> Self {
        MemoryStore {
            data: HashMap::with_capacity((capacity as f64 * CAPACITY_OVERHEAD_FACTOR) as usize),
            next_cleanup: None,
            cleanup_interval,
            expired_count: 0,
        }
    }

    /// Number of physically stored keys, including expired ones not yet cleaned
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[cfg(test)]
    pub fn expired_count(&self) -> usize {
        self.expired_count
    }

    /// Remaining time to live of a key, `None` if missing, expired or persistent
    pub fn ttl(&self, key: &str, now: SystemTime) -> Option<Duration> {
        let entry = self.data.get(key).filter(|e| e.is_live(now))?;
        entry
            .expires_at
            .and_then(|expiry| expiry.duration_since(now).ok())
    }

    /// Members of a sliding window, ordered by score
    pub fn window_members(&self, key: &str, now: SystemTime) -> Vec<(i64, String)> {
        match self.data.get(key) {
            Some(entry) if entry.is_live(now) => match &entry.value {
                Value::Window(set) => set.iter().cloned().collect(),
                Value::Text(_) => Vec::new(),
            },
            _ => Vec::new(),
        }
    }

    fn maybe_clean_expired(&mut self, now: SystemTime) {
        match self.next_cleanup {
            None => self.next_cleanup = Some(now + self.cleanup_interval),
            Some(deadline) if now >= deadline => {
                let before_count = self.data.len();
                self.data.retain(|_, entry| entry.is_live(now));
                self.expired_count = before_count.saturating_sub(self.data.len());
                self.next_cleanup = Some(now + self.cleanup_interval);
            }
            Some(_) => {}
        }
    }

    /// Live entry for `key`, dropping it first if it has expired
    fn live_entry(&mut self, key: &str, now: SystemTime) -> Option<&mut Entry> {
        if self.data.get(key).is_some_and(|e| !e.is_live(now)) {
            self.data.remove(key);
        }
        self.data.get_mut(key)
    }

    /// ZREMRANGEBYSCORE + ZCARD + ZADD + EXPIRE in one step
    pub fn window_batch(&mut self, batch: &WindowBatch, now: SystemTime) -> Result<u64, StoreError> {
        self.maybe_clean_expired(now);

        if self.data.get(&batch.key).is_some_and(|e| !e.is_live(now)) {
            self.data.remove(&batch.key);
        }
        let entry = self
            .data
            .entry(batch.key.clone())
            .or_insert_with(|| Entry {
                value: Value::Window(BTreeSet::new()),
                expires_at: None,
            });

        let set = match &mut entry.value {
            Value::Window(set) => set,
            Value::Text(_) => return Err(StoreError::WrongType(batch.key.clone())),
        };

        // Everything at or above (prune_before_ms, "") survives
        let kept = set.split_off(&(batch.prune_before_ms, String::new()));
        *set = kept;

        let count = set.len() as u64;

        // ZADD on an existing member moves it rather than duplicating it
        set.retain(|(_, member)| member != &batch.member);
        set.insert((batch.score_ms, batch.member.clone()));

        entry.expires_at = Some(now + batch.ttl);

        Ok(count)
    }

    pub fn get(&self, key: &str, now: SystemTime) -> Result<Option<String>, StoreError> {
        match self.data.get(key) {
            Some(entry) if entry.is_live(now) => match &entry.value {
                Value::Text(text) => Ok(Some(text.clone())),
                Value::Window(_) => Err(StoreError::WrongType(key.to_string())),
            },
            _ => Ok(None),
        }
    }

    pub fn set(&mut self, key: &str, value: &str, ttl: Duration, now: SystemTime) {
        self.maybe_clean_expired(now);

        self.data.insert(
            key.to_string(),
            Entry {
                value: Value::Text(value.to_string()),
                expires_at: Some(now + ttl),
            },
        );
    }

    pub fn delete(&mut self, key: &str, now: SystemTime) -> bool {
        match self.data.remove(key) {
            Some(entry) => entry.is_live(now),
            None => false,
        }
    }

    /// INCR: missing keys start at 0 and stay persistent, existing TTLs are kept
    pub fn incr(&mut self, key: &str, now: SystemTime) -> Result<i64, StoreError> {
        self.maybe_clean_expired(now);

        match self.live_entry(key, now) {
            Some(entry) => {
                let Value::Text(text) = &mut entry.value else {
                    return Err(StoreError::WrongType(key.to_string()));
                };
                let current: i64 = text.parse().map_err(|_| {
                    StoreError::InvalidValue(format!("value at {key} is not an integer"))
                })?;
                let next = current.checked_add(1).ok_or_else(|| {
                    StoreError::InvalidValue(format!("increment at {key} would overflow"))
                })?;
                *text = next.to_string();
                Ok(next)
            }
            None => {
                self.data.insert(
                    key.to_string(),
                    Entry {
                        value: Value::Text("1".to_string()),
                        expires_at: None,
                    },
                );
                Ok(1)
            }
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for MemoryStoreBuilder {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            cleanup_interval: Duration::from_secs(DEFAULT_CLEANUP_INTERVAL_SECS),
        }
    }
}

impl MemoryStoreBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the expected capacity (number of unique keys)
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Set the interval between cleanup passes
    ///
    /// Shorter intervals mean more consistent memory usage but higher CPU overhead.
    pub fn cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = interval;
        self
    }

    pub fn build(self) -> MemoryStore {
        MemoryStore::with_config(self.capacity, self.cleanup_interval)
    }
}
