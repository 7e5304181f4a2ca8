//! Bounded async connection pool.
//!
//! One pool instance per backend (Postgres, Redis), both going through the
//! same generic machinery. A tokio semaphore bounds live connections at
//! `max_size`; idle connections sit in a plain `Vec` behind a mutex and are
//! reused in LIFO order. Acquiring hands out a [`Lease`], an RAII guard that
//! owns its semaphore permit — dropping the lease on any exit path,
//! including cancellation, returns both the connection and the capacity.

use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::time::{timeout_at, Instant};

use crate::error::PoolError;

const POISONED: &str = "pool idle set mutex poisoned";

/// A poolable backend connection.
///
/// Implementations wrap one native connection to an external service. The
/// pool only ever asks to open or close one; everything in between happens
/// through the lease's `Deref` to the connection itself.
#[async_trait]
pub trait Backend: Send + Sized + 'static {
    /// Whatever is needed to open a connection (URL, client handle, ...).
    type Config: Clone + Send + Sync + 'static;
    /// The driver's connect error.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Open a fresh connection.
    async fn connect(config: &Self::Config) -> Result<Self, Self::Error>;

    /// Gracefully close the connection. Dropping without calling this is
    /// allowed (invalidated connections, cancelled operations) and falls
    /// back to the driver's drop behavior.
    async fn close(self);
}

/// Pool sizing and acquire-deadline knobs.
///
/// `min_size` is derived, not configured: a quarter of `max_size`, rounded
/// down, and never less than one. That many connections are opened eagerly
/// when the pool is constructed. This is a tuning default, not a
/// correctness requirement.
#[derive(Debug, Clone)]
pub struct PoolOptions {
    max_size: usize,
    acquire_timeout: Duration,
}

impl PoolOptions {
    pub const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

    /// Options for a pool holding at most `max_size` connections
    /// (clamped to at least one).
    pub fn new(max_size: usize) -> Self {
        Self {
            max_size: max_size.max(1),
            acquire_timeout: Self::DEFAULT_ACQUIRE_TIMEOUT,
        }
    }

    /// Override the acquire deadline. The deadline covers the wait for a
    /// free slot and, when a fresh connection has to be opened, the connect
    /// itself.
    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn min_size(&self) -> usize {
        (self.max_size / 4).max(1)
    }
}

/// Point-in-time pool counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    /// Idle connections ready for reuse.
    pub idle: usize,
    /// Free capacity: leases that could be handed out right now.
    pub available: usize,
    /// Configured ceiling on live connections.
    pub max_size: usize,
}

struct PoolInner<B: Backend> {
    config: B::Config,
    options: PoolOptions,
    semaphore: Arc<Semaphore>,
    idle: Mutex<Vec<B>>,
    closed: AtomicBool,
}

/// Shared handle to a bounded connection pool.
///
/// Cloning is cheap and every clone refers to the same pool. The handle is
/// constructed once by the composition root and threaded into whatever
/// needs connections; there is no global instance.
pub struct ConnectionPool<B: Backend> {
    inner: Arc<PoolInner<B>>,
}

impl<B: Backend> Clone for ConnectionPool<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<B: Backend> std::fmt::Debug for ConnectionPool<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let stats = self.stats();
        f.debug_struct("ConnectionPool")
            .field("idle", &stats.idle)
            .field("available", &stats.available)
            .field("max_size", &stats.max_size)
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl<B: Backend> ConnectionPool<B> {
    /// Create a pool and eagerly open its `min_size` warm connections.
    ///
    /// Fails fast if the backend cannot be reached, so a misconfigured
    /// process dies at startup instead of on the first request.
    pub async fn connect(config: B::Config, options: PoolOptions) -> Result<Self, PoolError> {
        let pool = Self {
            inner: Arc::new(PoolInner {
                semaphore: Arc::new(Semaphore::new(options.max_size())),
                idle: Mutex::new(Vec::with_capacity(options.max_size())),
                closed: AtomicBool::new(false),
                config,
                options,
            }),
        };

        for _ in 0..pool.inner.options.min_size() {
            let conn = pool.open_within(Instant::now() + pool.inner.options.acquire_timeout)
                .await?;
            pool.inner.idle.lock().expect(POISONED).push(conn);
        }

        tracing::debug!(
            min_size = pool.inner.options.min_size(),
            max_size = pool.inner.options.max_size(),
            "connection pool ready"
        );
        Ok(pool)
    }

    /// Take exclusive ownership of one connection until the returned lease
    /// is dropped.
    ///
    /// Suspends while the pool is at capacity. Fails with
    /// [`PoolError::Timeout`] once the acquire deadline passes and with
    /// [`PoolError::Closed`] after [`close`](Self::close).
    pub async fn acquire(&self) -> Result<Lease<B>, PoolError> {
        let inner = &self.inner;
        if inner.closed.load(Ordering::Acquire) {
            return Err(PoolError::Closed);
        }

        let acquire_timeout = inner.options.acquire_timeout;
        let deadline = Instant::now() + acquire_timeout;

        let permit = match timeout_at(deadline, inner.semaphore.clone().acquire_owned()).await {
            Ok(Ok(permit)) => permit,
            Ok(Err(_)) => return Err(PoolError::Closed),
            Err(_) => return Err(PoolError::Timeout(acquire_timeout)),
        };
        // The permit may have been freed by a lease racing with close().
        if inner.closed.load(Ordering::Acquire) {
            return Err(PoolError::Closed);
        }

        let reusable = inner.idle.lock().expect(POISONED).pop();
        let conn = match reusable {
            Some(conn) => {
                tracing::debug!("reusing idle connection");
                conn
            }
            None => {
                let conn = self.open_within(deadline).await?;
                tracing::debug!("opened new connection");
                conn
            }
        };

        Ok(Lease {
            conn: Some(conn),
            broken: false,
            pool: Arc::clone(inner),
            _permit: permit,
        })
    }

    /// Close the pool: reject new acquires, wait for every outstanding
    /// lease to be returned, then close all connections.
    ///
    /// A second call fails with [`PoolError::Closed`].
    pub async fn close(&self) -> Result<(), PoolError> {
        if self.inner.closed.swap(true, Ordering::AcqRel) {
            return Err(PoolError::Closed);
        }

        // Every outstanding lease owns one permit; collecting the full
        // permit count therefore waits for all of them to come home.
        let all = self
            .inner
            .semaphore
            .clone()
            .acquire_many_owned(self.inner.options.max_size() as u32)
            .await
            .expect("pool semaphore closed before shutdown");
        self.inner.semaphore.close();
        all.forget();

        let idle: Vec<B> = self.inner.idle.lock().expect(POISONED).drain(..).collect();
        let count = idle.len();
        for conn in idle {
            conn.close().await;
        }
        tracing::debug!(connections = count, "connection pool closed");
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            idle: self.inner.idle.lock().expect(POISONED).len(),
            available: self.inner.semaphore.available_permits(),
            max_size: self.inner.options.max_size(),
        }
    }

    async fn open_within(&self, deadline: Instant) -> Result<B, PoolError> {
        match timeout_at(deadline, B::connect(&self.inner.config)).await {
            Ok(Ok(conn)) => Ok(conn),
            Ok(Err(err)) => Err(PoolError::Connect(Box::new(err))),
            Err(_) => Err(PoolError::Timeout(self.inner.options.acquire_timeout)),
        }
    }
}

/// Exclusive ownership of one pooled connection for the duration of one
/// operation.
///
/// Dropping the lease returns the connection to the idle set and frees its
/// capacity slot — on normal return, early return, failure, and
/// cancellation alike. There is no explicit release call to forget.
pub struct Lease<B: Backend> {
    conn: Option<B>,
    broken: bool,
    pool: Arc<PoolInner<B>>,
    _permit: OwnedSemaphorePermit,
}

impl<B: Backend> Lease<B> {
    /// Mark the connection as broken. On drop it is discarded instead of
    /// returned to the idle set, and the freed slot lets a later acquire
    /// open a replacement.
    pub fn invalidate(&mut self) {
        self.broken = true;
    }
}

impl<B: Backend> std::fmt::Debug for Lease<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lease")
            .field("broken", &self.broken)
            .finish_non_exhaustive()
    }
}

impl<B: Backend> Deref for Lease<B> {
    type Target = B;

    fn deref(&self) -> &B {
        self.conn.as_ref().expect("lease connection already taken")
    }
}

impl<B: Backend> DerefMut for Lease<B> {
    fn deref_mut(&mut self) -> &mut B {
        self.conn.as_mut().expect("lease connection already taken")
    }
}

impl<B: Backend> Drop for Lease<B> {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            if self.broken {
                tracing::debug!("discarding invalidated connection");
            } else if self.pool.closed.load(Ordering::Acquire) {
                // Pool shutdown in progress; the connection is dropped here
                // and close() only has the idle set left to drain.
            } else {
                self.pool.idle.lock().expect(POISONED).push(conn);
            }
        }
        // _permit drops after this body, releasing the capacity slot only
        // once the connection is back in the idle set.
    }
}

#[cfg(test)]
mod tests {
    use std::future;
    use std::sync::atomic::AtomicUsize;

    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("test backend refused connection")]
    struct TestError;

    #[derive(Default)]
    struct TestState {
        connects: AtomicUsize,
        closes: AtomicUsize,
        fail_connect: AtomicBool,
        hang_connect: AtomicBool,
    }

    struct TestConn {
        state: Arc<TestState>,
        serial: usize,
    }

    #[async_trait]
    impl Backend for TestConn {
        type Config = Arc<TestState>;
        type Error = TestError;

        async fn connect(config: &Self::Config) -> Result<Self, Self::Error> {
            if config.hang_connect.load(Ordering::SeqCst) {
                future::pending::<()>().await;
            }
            if config.fail_connect.load(Ordering::SeqCst) {
                return Err(TestError);
            }
            let serial = config.connects.fetch_add(1, Ordering::SeqCst);
            Ok(Self {
                state: Arc::clone(config),
                serial,
            })
        }

        async fn close(self) {
            self.state.closes.fetch_add(1, Ordering::SeqCst);
        }
    }

    async fn test_pool(max_size: usize) -> (ConnectionPool<TestConn>, Arc<TestState>) {
        let state = Arc::new(TestState::default());
        let pool = ConnectionPool::connect(Arc::clone(&state), PoolOptions::new(max_size))
            .await
            .expect("pool construction failed");
        (pool, state)
    }

    #[test]
    fn min_size_is_quarter_of_max_at_least_one() {
        assert_eq!(PoolOptions::new(50).min_size(), 12);
        assert_eq!(PoolOptions::new(100).min_size(), 25);
        assert_eq!(PoolOptions::new(4).min_size(), 1);
        assert_eq!(PoolOptions::new(3).min_size(), 1);
        assert_eq!(PoolOptions::new(1).min_size(), 1);
    }

    #[tokio::test]
    async fn opens_min_size_connections_eagerly() {
        let (pool, state) = test_pool(8).await;
        assert_eq!(state.connects.load(Ordering::SeqCst), 2);
        assert_eq!(pool.stats().idle, 2);
        assert_eq!(pool.stats().available, 8);
    }

    #[tokio::test]
    async fn acquire_reuses_idle_connection() {
        let (pool, state) = test_pool(4).await;

        let first = pool.acquire().await.expect("first acquire");
        let serial = first.serial;
        drop(first);

        let second = pool.acquire().await.expect("second acquire");
        assert_eq!(second.serial, serial);
        assert_eq!(state.connects.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn concurrent_leases_never_exceed_max() {
        let (pool, _state) = test_pool(4).await;
        let leased = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let pool = pool.clone();
                let leased = Arc::clone(&leased);
                let peak = Arc::clone(&peak);
                tokio::spawn(async move {
                    let lease = pool.acquire().await.expect("acquire");
                    let now = leased.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(1)).await;
                    leased.fetch_sub(1, Ordering::SeqCst);
                    drop(lease);
                })
            })
            .collect();
        for task in tasks {
            task.await.expect("task panicked");
        }

        assert!(peak.load(Ordering::SeqCst) <= 4);
        // All capacity restored once every lease is back.
        assert_eq!(pool.stats().available, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn acquire_times_out_when_pool_exhausted() {
        let (pool, _state) = test_pool(1).await;
        let _held = pool.acquire().await.expect("acquire");

        let err = pool.acquire().await.expect_err("should time out");
        assert!(matches!(err, PoolError::Timeout(_)));
    }

    #[tokio::test]
    async fn acquire_and_close_fail_after_close() {
        let (pool, _state) = test_pool(2).await;
        pool.close().await.expect("close");

        assert!(matches!(pool.acquire().await, Err(PoolError::Closed)));
        assert!(matches!(pool.close().await, Err(PoolError::Closed)));
        assert!(pool.is_closed());
    }

    #[tokio::test]
    async fn close_waits_for_outstanding_leases() {
        let (pool, state) = test_pool(2).await;
        let lease = pool.acquire().await.expect("acquire");

        let closer = {
            let pool = pool.clone();
            tokio::spawn(async move { pool.close().await })
        };
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert!(!closer.is_finished());

        drop(lease);
        closer.await.expect("close task").expect("close");
        // The dropped lease's connection is discarded during shutdown, so
        // only connections still idle get a graceful close.
        assert!(state.closes.load(Ordering::SeqCst) <= state.connects.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn close_closes_idle_connections() {
        let (pool, state) = test_pool(8).await;
        pool.close().await.expect("close");
        assert_eq!(state.closes.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn cancelled_acquire_does_not_leak_capacity() {
        let (pool, state) = test_pool(2).await;
        // Drain the single warm connection so the next acquire must dial.
        let held = pool.acquire().await.expect("acquire");
        state.hang_connect.store(true, Ordering::SeqCst);

        let hung = {
            let pool = pool.clone();
            tokio::spawn(async move { pool.acquire().await })
        };
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        hung.abort();
        let _ = hung.await;

        // The aborted acquire returned its permit; only the held lease
        // still occupies a slot.
        assert_eq!(pool.stats().available, 1);

        state.hang_connect.store(false, Ordering::SeqCst);
        let lease = pool.acquire().await.expect("acquire after abort");
        drop(lease);
        drop(held);
        assert_eq!(pool.stats().available, 2);
    }

    #[tokio::test]
    async fn invalidated_connection_is_discarded() {
        let (pool, state) = test_pool(4).await;

        let mut lease = pool.acquire().await.expect("acquire");
        lease.invalidate();
        drop(lease);
        assert_eq!(pool.stats().idle, 0);

        let replacement = pool.acquire().await.expect("acquire");
        assert_eq!(state.connects.load(Ordering::SeqCst), 2);
        drop(replacement);
    }

    #[tokio::test]
    async fn failed_connect_surfaces_and_frees_capacity() {
        let (pool, state) = test_pool(1).await;
        // Discard the warm connection so acquires have to dial.
        let mut lease = pool.acquire().await.expect("acquire");
        lease.invalidate();
        drop(lease);

        state.fail_connect.store(true, Ordering::SeqCst);
        let err = pool.acquire().await.expect_err("connect should fail");
        assert!(matches!(err, PoolError::Connect(_)));

        state.fail_connect.store(false, Ordering::SeqCst);
        let lease = pool.acquire().await.expect("acquire after failure");
        drop(lease);
        assert_eq!(pool.stats().available, 1);
    }
}
