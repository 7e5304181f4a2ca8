//! Redis connection backend.

use std::ops::{Deref, DerefMut};

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::Client;

use crate::pool::Backend;

/// One Redis connection, pooled by [`ConnectionPool`].
///
/// Each `connect` opens a distinct TCP connection; parsing the URL into a
/// [`redis::Client`] is pure and happens per attempt.
///
/// [`ConnectionPool`]: crate::pool::ConnectionPool
pub struct RedisConn {
    conn: MultiplexedConnection,
}

#[async_trait]
impl Backend for RedisConn {
    type Config = String;
    type Error = redis::RedisError;

    async fn connect(url: &String) -> Result<Self, redis::RedisError> {
        let client = Client::open(url.as_str())?;
        let conn = client.get_multiplexed_async_connection().await?;
        Ok(Self { conn })
    }

    async fn close(self) {
        // No explicit close in the driver; dropping the handle shuts the
        // connection task down.
    }
}

impl Deref for RedisConn {
    type Target = MultiplexedConnection;

    fn deref(&self) -> &MultiplexedConnection {
        &self.conn
    }
}

impl DerefMut for RedisConn {
    fn deref_mut(&mut self) -> &mut MultiplexedConnection {
        &mut self.conn
    }
}
