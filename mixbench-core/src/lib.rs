//! mixbench-core: the resource-pooling and cache-aside access layer.
//!
//! Everything the benchmark endpoints share lives here: a generic bounded
//! connection pool instantiated once for Postgres and once for Redis, thin
//! store/cache facades over those pools, and the read-through reader that
//! composes them. The HTTP surface in `mixbench-server` is glue around
//! these types; no pool or client is reachable through a global.

pub mod backend;
pub mod cache;
pub mod config;
pub mod error;
pub mod mix;
pub mod pool;
pub mod store;

pub use backend::{PgConn, RedisConn};
pub use cache::KeyValueCache;
pub use config::Config;
pub use error::{CacheError, ConfigError, PoolError, ReadError, StoreError};
pub use mix::{cache_key, CacheAsideReader, RecordLookup, StringCache, MISS_SENTINEL, POPULATE_TTL};
pub use pool::{Backend, ConnectionPool, Lease, PoolOptions, PoolStats};
pub use store::{Record, RecordStore};
