//! # jobboard
//!
//! Request admission and cache coherency for a job-board backend, built on a
//! shared key-value store.
//!
//! ## Overview
//!
//! The crate provides two coordination primitives that every server process
//! shares through one store (Redis in production):
//! - **Sliding-window rate limiting**: at most `N` requests per `(endpoint, identity)`
//!   in any trailing window of `W` seconds, with denied requests still counted
//! - **Cache invalidation**: version tags for search results and direct key
//!   deletion for point entities such as user profiles
//!
//! ## Quick Start
//!
//! ```
//! use jobboard::{LocalStore, SlidingWindowLimiter, SystemClock};
//! use std::sync::Arc;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), jobboard::LimitError> {
//! let limiter = SlidingWindowLimiter::new(LocalStore::default(), Arc::new(SystemClock));
//!
//! // 5 sign-in attempts per minute per address
//! let verdict = limiter.check("203.0.113.7", "/user/sign_in", 5, 60).await?;
//!
//! if verdict.allowed {
//!     println!("Request allowed ({} earlier in window)", verdict.count);
//! } else {
//!     println!("Rate limited! Retry after: {} seconds", verdict.retry_after.as_secs());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Stores
//!
//! Everything talks to a [`KvStore`]. The crate ships one backend:
//!
//! ### [`LocalStore`]
//! A mutex-guarded [`MemoryStore`] for single-process deployments and tests.
//! The server crate adds a Redis backend behind the same trait.
//!
//! ```
//! use jobboard::{LocalStore, ManualClock, MemoryStore};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let store = MemoryStore::builder()
//!     .capacity(100_000)
//!     .cleanup_interval(Duration::from_secs(60))
//!     .build();
//! let local = LocalStore::new(store, Arc::new(ManualClock::starting_now()));
//! ```
//!
//! ## Cache Invalidation
//!
//! ```
//! use jobboard::{CacheCoordinator, LocalStore, ResourceClass, SearchKey, StoreError};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), StoreError> {
//! let cache = CacheCoordinator::new(LocalStore::default());
//! let query = SearchKey::new(10, 0).param("city", Some("Almaty"));
//!
//! let hits = cache
//!     .search(ResourceClass::VACANCIES, &query, || async { Ok::<_, StoreError>(vec![1, 2]) })
//!     .await?;
//! println!("served from {}", hits.source);
//!
//! // After committing a vacancy mutation
//! cache.invalidate_class(ResourceClass::VACANCIES).await;
//! # Ok(())
//! # }
//! ```
//!
//! ## Thread Safety
//!
//! [`SlidingWindowLimiter`] and [`CacheCoordinator`] take `&self` and are
//! `Send + Sync` whenever their store is, so they can be shared through an
//! `Arc` without extra locking.
//!
//! ## Features
//!
//! - `ahash` (default): Use AHash for faster hashing in [`MemoryStore`]

pub mod core;

pub use core::{
    CacheCoordinator, CacheSource, Cached, Clock, KvStore, LimitError, LocalStore, ManualClock,
    MemoryStore, MemoryStoreBuilder, ResourceClass, SearchKey, SharedClock, SlidingWindowLimiter,
    StoreError, SystemClock, Verdict, WindowBatch, WindowLimit,
};
pub use core::clock::unix_millis;
