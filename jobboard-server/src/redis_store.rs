//! [`KvStore`] over Redis
//!
//! The window batch is sent as one `MULTI/EXEC` pipeline, so concurrent
//! checks against the same key serialize inside Redis. The connection manager
//! reconnects on its own; a failed round-trip surfaces as
//! [`StoreError::Unavailable`] and is never retried here.

use async_trait::async_trait;
use jobboard::{KvStore, StoreError, WindowBatch};
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, ErrorKind, RedisError};
use std::time::Duration;

#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    /// Open a managed connection to `url`
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(url).map_err(|e| map_err(e, url))?;
        let conn = ConnectionManager::new(client)
            .await
            .map_err(|e| map_err(e, url))?;
        Ok(Self { conn })
    }
}

fn map_err(err: RedisError, key: &str) -> StoreError {
    if err.code() == Some("WRONGTYPE") {
        return StoreError::WrongType(key.to_string());
    }
    match err.kind() {
        ErrorKind::TypeError | ErrorKind::ResponseError => {
            StoreError::InvalidValue(format!("{key}: {err}"))
        }
        _ => StoreError::Unavailable(err.to_string()),
    }
}

fn ttl_secs(ttl: Duration) -> u64 {
    ttl.as_secs().max(1)
}

#[async_trait]
impl KvStore for RedisStore {
    async fn window_batch(&self, batch: &WindowBatch) -> Result<u64, StoreError> {
        let mut conn = self.conn.clone();
        let key = batch.key.as_str();

        let (count,): (u64,) = redis::pipe()
            .atomic()
            .zrembyscore(key, "-inf", format!("({}", batch.prune_before_ms))
            .ignore()
            .zcard(key)
            .zadd(key, &batch.member, batch.score_ms)
            .ignore()
            .expire(key, ttl_secs(batch.ttl) as i64)
            .ignore()
            .query_async(&mut conn)
            .await
            .map_err(|e| map_err(e, key))?;

        Ok(count)
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.conn.clone();
        conn.get(key).await.map_err(|e| map_err(e, key))
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        conn.set_ex(key, value, ttl_secs(ttl))
            .await
            .map_err(|e| map_err(e, key))
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let mut conn = self.conn.clone();
        let removed: u64 = conn.del(key).await.map_err(|e| map_err(e, key))?;
        Ok(removed > 0)
    }

    async fn incr(&self, key: &str) -> Result<i64, StoreError> {
        let mut conn = self.conn.clone();
        conn.incr(key, 1i64).await.map_err(|e| map_err(e, key))
    }
}
