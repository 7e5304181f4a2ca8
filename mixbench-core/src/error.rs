//! Error taxonomy for the access layer.
//!
//! Libraries expose structured `thiserror` enums; the server binary wraps
//! them in `anyhow` where convenient. Absence of a record or cache key is
//! never an error — those surface as `Option::None`.

use std::time::Duration;

use thiserror::Error;

/// Boxed source for backend connect failures, so `PoolError` stays
/// independent of the backend driver's error type.
pub type BoxedBackendError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failures of the pool itself, as opposed to the operation running on a
/// pooled connection.
#[derive(Debug, Error)]
pub enum PoolError {
    /// No connection became available within the acquire deadline.
    /// Transient; never retried internally.
    #[error("timed out after {0:?} waiting for a pooled connection")]
    Timeout(Duration),

    /// The pool was closed before or during the call. Lifecycle error:
    /// the composition root closed the pool and something kept using it.
    #[error("connection pool is closed")]
    Closed,

    /// Opening a fresh backend connection failed.
    #[error("failed to open backend connection: {0}")]
    Connect(#[source] BoxedBackendError),
}

/// The relational store rejected an operation or no connection could be
/// supplied for it.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Pool(#[from] PoolError),

    #[error("store query failed: {0}")]
    Query(#[from] sqlx::Error),
}

/// The key-value cache rejected an operation or no connection could be
/// supplied for it. Non-fatal to the process: requests that do not touch
/// the cache keep working.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error(transparent)]
    Pool(#[from] PoolError),

    #[error("cache command failed: {0}")]
    Command(#[from] redis::RedisError),
}

/// A cache-aside read failed. A cache failure during the initial `get` is
/// a failure of the whole read — the reader does not silently fall back to
/// the store.
#[derive(Debug, Error)]
pub enum ReadError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Cache(#[from] CacheError),
}

/// Startup configuration problems. Required values fail fast in `main`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value {value:?} for {var}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}
