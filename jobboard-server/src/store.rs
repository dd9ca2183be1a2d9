//! Store factory
//!
//! Builds the shared [`KvStore`] selected by configuration.
//!
//! ## Redis
//! - Shared by every server process behind the load balancer
//! - Limiter batches run as `MULTI/EXEC` pipelines
//!
//! ## Memory
//! - Lives inside this process; limits and caches are per replica
//! - Every operation runs under one mutex acquisition

use crate::config::{StoreConfig, StoreType};
use crate::redis_store::RedisStore;
use anyhow::{Context, Result};
use jobboard::{KvStore, LocalStore, MemoryStore, SharedClock};
use std::sync::Arc;

/// Type-erased store handle shared by the limiter and the cache coordinator
pub type SharedStore = Arc<dyn KvStore>;

/// Create the configured store
///
/// `clock` drives key expiry of the in-process store; Redis keeps its own time.
pub async fn create_store(config: &StoreConfig, clock: SharedClock) -> Result<SharedStore> {
    match config.store_type {
        StoreType::Redis => {
            let store = RedisStore::connect(&config.redis_url)
                .await
                .with_context(|| format!("connecting to {}", config.redis_url))?;
            tracing::info!("Connected to Redis at {}", config.redis_url);
            Ok(Arc::new(store))
        }
        StoreType::Memory => {
            let store = MemoryStore::builder()
                .capacity(config.capacity)
                .cleanup_interval(config.cleanup_interval)
                .build();
            tracing::warn!("Using in-process store; limits are not shared between replicas");
            Ok(Arc::new(LocalStore::new(store, clock)))
        }
    }
}
