//! Core components of the jobboard coordination library
//!
//! This module contains the fundamental building blocks:
//! - [`clock`]: Injectable time source
//! - [`store`]: Shared key-value store contract and the in-process backend
//! - [`rate_limiter`]: The sliding-window rate limiter
//! - [`cache`]: Version-tag and direct-key cache invalidation

pub mod cache;
pub mod clock;
pub mod rate_limiter;
pub mod store;


pub use cache::{CacheCoordinator, CacheSource, Cached, ResourceClass, SearchKey};
pub use clock::{Clock, ManualClock, SharedClock, SystemClock};
pub use rate_limiter::{SlidingWindowLimiter, Verdict, WindowLimit};
pub use store::{KvStore, LocalStore, MemoryStore, MemoryStoreBuilder, WindowBatch};

use std::error::Error;
use std::fmt;

/// Errors reported by a [`KvStore`] backend
///
/// # Variants
///
/// - [`Unavailable`](StoreError::Unavailable): The store could not be reached or the round-trip failed
/// - [`WrongType`](StoreError::WrongType): The key holds a value of another type
/// - [`InvalidValue`](StoreError::InvalidValue): A stored value could not be interpreted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The store could not be reached or the round-trip failed
    Unavailable(String),
    /// The key holds a value of a different type than the operation expects
    WrongType(String),
    /// A stored value could not be interpreted (e.g. INCR on a non-integer)
    InvalidValue(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Unavailable(msg) => write!(f, "store unavailable: {msg}"),
            StoreError::WrongType(key) => write!(f, "wrong value type at key {key}"),
            StoreError::InvalidValue(msg) => write!(f, "invalid stored value: {msg}"),
        }
    }
}

impl Error for StoreError {}

/// Errors that can occur during a rate limit check
///
/// # Example
///
/// ```
/// use jobboard::{LimitError, LocalStore, SlidingWindowLimiter, SystemClock};
/// use std::sync::Arc;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let limiter = SlidingWindowLimiter::new(LocalStore::default(), Arc::new(SystemClock));
///
/// // A zero-sized window can never admit anything
/// match limiter.check("user:1", "/search", 5, 0).await {
///     Err(LimitError::InvalidLimit) => {}
///     other => panic!("unexpected: {other:?}"),
/// }
/// # }
/// ```
#[derive(Debug)]
pub enum LimitError {
    /// Limit parameters are invalid (max_requests or window_seconds is zero)
    InvalidLimit,
    /// The backing store failed
    Store(StoreError),
}

impl fmt::Display for LimitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LimitError::InvalidLimit => write!(f, "invalid rate limit parameters"),
            LimitError::Store(e) => write!(f, "rate limit check failed: {e}"),
        }
    }
}

impl Error for LimitError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            LimitError::InvalidLimit => None,
            LimitError::Store(e) => Some(e),
        }
    }
}

impl From<StoreError> for LimitError {
    fn from(e: StoreError) -> Self {
        LimitError::Store(e)
    }
}
