//! Sliding-window rate limiter implementation
//!
//! This module provides [`SlidingWindowLimiter`], which admits a request when
//! fewer than `max_requests` requests were observed for the same
//! `(endpoint, identity)` pair in the trailing `window_seconds`.
//!
//! Every check, admitted or not, records its own timestamp. A caller that
//! keeps retrying while denied therefore keeps itself denied until it backs
//! off for a full window.

use super::LimitError;
use super::clock::{SharedClock, unix_millis};
use super::store::{KvStore, WindowBatch};
use std::time::Duration;

/// Prefix of every limiter key in the shared store
pub const KEY_PREFIX: &str = "rate_limiter";

/// Request budget for one endpoint
///
/// # Example
///
/// ```
/// use jobboard::WindowLimit;
///
/// let limit = WindowLimit::new(5, 60);
/// assert_eq!(limit.window().as_secs(), 60);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowLimit {
    pub max_requests: u32,
    pub window_seconds: u64,
}

impl WindowLimit {
    pub const fn new(max_requests: u32, window_seconds: u64) -> Self {
        Self {
            max_requests,
            window_seconds,
        }
    }

    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_seconds)
    }
}

impl Default for WindowLimit {
    fn default() -> Self {
        Self::new(5, 60)
    }
}

/// Outcome of a rate limit check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    /// Whether the request is admitted
    pub allowed: bool,
    /// The configured maximum for the window
    pub limit: u32,
    /// Requests seen in the trailing window before this one
    pub count: u64,
    /// How long a denied caller should wait; zero when admitted
    pub retry_after: Duration,
}

/// Sliding-window rate limiter over a shared [`KvStore`]
///
/// Each `(endpoint, identity)` pair owns one ordered set of timestamp markers
/// at `rate_limiter:{endpoint}:{identity}`. A check prunes markers older than
/// the window, counts what remains, inserts its own marker and refreshes the
/// key's expiry, all in one atomic store batch.
///
/// # Example
///
/// ```
/// use jobboard::{LocalStore, ManualClock, SlidingWindowLimiter};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let clock = ManualClock::starting_now();
/// let store = LocalStore::with_clock(Arc::new(clock.clone()));
/// let limiter = SlidingWindowLimiter::new(store, Arc::new(clock.clone()));
///
/// for _ in 0..5 {
///     assert!(limiter.check("42", "/search/search_vacancies", 5, 60).await.unwrap().allowed);
/// }
/// assert!(!limiter.check("42", "/search/search_vacancies", 5, 60).await.unwrap().allowed);
///
/// clock.advance(Duration::from_secs(61));
/// assert!(limiter.check("42", "/search/search_vacancies", 5, 60).await.unwrap().allowed);
/// # }
/// ```
pub struct SlidingWindowLimiter<S> {
    store: S,
    clock: SharedClock,
}

impl<S: KvStore> SlidingWindowLimiter<S> {
    pub fn new(store: S, clock: SharedClock) -> Self {
        Self { store, clock }
    }

    /// Store key for an endpoint and identity
    pub fn key(endpoint: &str, identity: &str) -> String {
        format!("{KEY_PREFIX}:{endpoint}:{identity}")
    }

    /// Check and record one request
    ///
    /// # Errors
    ///
    /// - [`LimitError::InvalidLimit`]: `max_requests` or `window_seconds` is zero
    /// - [`LimitError::Store`]: the store batch failed; nothing is recorded
    pub async fn check(
        &self,
        identity: &str,
        endpoint: &str,
        max_requests: u32,
        window_seconds: u64,
    ) -> Result<Verdict, LimitError> {
        if max_requests == 0 || window_seconds == 0 {
            return Err(LimitError::InvalidLimit);
        }

        let window = Duration::from_secs(window_seconds);
        let now_ms = unix_millis(self.clock.now());
        let window_ms = i64::try_from(window.as_millis()).unwrap_or(i64::MAX);

        let batch = WindowBatch {
            key: Self::key(endpoint, identity),
            prune_before_ms: now_ms.saturating_sub(window_ms),
            member: format!("{now_ms}-{}", rand::random::<u64>()),
            score_ms: now_ms,
            ttl: window,
        };

        let count = self.store.window_batch(&batch).await?;
        let allowed = count < u64::from(max_requests);

        if !allowed {
            tracing::debug!(
                endpoint,
                identity,
                count,
                max_requests,
                "sliding window exhausted"
            );
        }

        Ok(Verdict {
            allowed,
            limit: max_requests,
            count,
            retry_after: if allowed { Duration::ZERO } else { window },
        })
    }

    /// [`check`](Self::check) with a [`WindowLimit`]
    pub async fn check_limit(
        &self,
        identity: &str,
        endpoint: &str,
        limit: WindowLimit,
    ) -> Result<Verdict, LimitError> {
        self.check(identity, endpoint, limit.max_requests, limit.window_seconds)
            .await
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}
