//! Cache-aside composition over the store and the cache.
//!
//! Read path for one logical id: consult the cache first; on a miss, read
//! the store, write the result back with a TTL, and return it. A store
//! miss is itself a cacheable fact and is written as the sentinel value
//! rather than treated as an error.
//!
//! The populate step is deliberately racy. Two concurrent readers of the
//! same id can both miss, both read the store, and both write the cache —
//! the last writer wins and the duplicate store read is tolerated. There
//! is no per-key single-flight and no locking; the only way a populated
//! entry reverts to unknown is TTL expiry or a direct overwrite.

use std::time::Duration;

use async_trait::async_trait;

use crate::cache::KeyValueCache;
use crate::error::{CacheError, ReadError, StoreError};
use crate::store::{Record, RecordStore};

/// Cached stand-in for "no such record". Stored and served like any real
/// payload.
pub const MISS_SENTINEL: &str = "none";

/// Lifetime of entries written by the read path.
pub const POPULATE_TTL: Duration = Duration::from_secs(30);

/// Cache key for a logical item id.
pub fn cache_key(id: i64) -> String {
    format!("mix:{id}")
}

/// Read side of the record store, as the reader sees it.
#[async_trait]
pub trait RecordLookup: Send + Sync {
    async fn get_one(&self, id: i64) -> Result<Option<Record>, StoreError>;
}

/// String cache with TTL, as the reader sees it.
#[async_trait]
pub trait StringCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;
}

#[async_trait]
impl RecordLookup for RecordStore {
    async fn get_one(&self, id: i64) -> Result<Option<Record>, StoreError> {
        RecordStore::get_one(self, id).await
    }
}

#[async_trait]
impl StringCache for KeyValueCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        KeyValueCache::get(self, key).await
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        KeyValueCache::set(self, key, value, ttl).await
    }
}

/// Read-through reader combining a record source with a TTL cache.
#[derive(Debug, Clone)]
pub struct CacheAsideReader<S = RecordStore, C = KeyValueCache> {
    store: S,
    cache: C,
}

impl<S: RecordLookup, C: StringCache> CacheAsideReader<S, C> {
    pub fn new(store: S, cache: C) -> Self {
        Self { store, cache }
    }

    /// Resolve the value for `id`, populating the cache on a miss.
    ///
    /// A cache failure during the initial lookup fails the whole read;
    /// there is no silent fallback to the store.
    pub async fn read(&self, id: i64) -> Result<String, ReadError> {
        let key = cache_key(id);
        if let Some(hit) = self.cache.get(&key).await? {
            return Ok(hit);
        }
        let value = match self.store.get_one(id).await? {
            Some(record) => record.payload,
            None => MISS_SENTINEL.to_owned(),
        };
        self.cache.set(&key, &value, POPULATE_TTL).await?;
        Ok(value)
    }
}
