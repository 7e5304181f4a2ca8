//! String cache access over the Redis pool.

use std::time::Duration;

use redis::AsyncCommands;

use crate::backend::RedisConn;
use crate::error::CacheError;
use crate::pool::ConnectionPool;

/// Stateless facade over the Redis pool: plain `GET` / `SET ... EX`
/// semantics, one lease per call.
#[derive(Debug, Clone)]
pub struct KeyValueCache {
    pool: ConnectionPool<RedisConn>,
}

impl KeyValueCache {
    pub fn new(pool: ConnectionPool<RedisConn>) -> Self {
        Self { pool }
    }

    /// Look up a key. `None` covers both "never set" and "expired"; the
    /// cache does not distinguish the two.
    pub async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.pool.acquire().await?;
        let result: Result<Option<String>, redis::RedisError> = conn.get(key).await;
        match result {
            Ok(value) => Ok(value),
            Err(err) => {
                conn.invalidate();
                Err(err.into())
            }
        }
    }

    /// Unconditionally overwrite `key` with `value`, expiring `ttl` from
    /// now. No compare-and-swap, no versioning. The TTL is sent in whole
    /// seconds; sub-second durations truncate.
    pub async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.pool.acquire().await?;
        let result: Result<(), redis::RedisError> = conn.set_ex(key, value, ttl.as_secs()).await;
        match result {
            Ok(()) => Ok(()),
            Err(err) => {
                conn.invalidate();
                Err(err.into())
            }
        }
    }
}
