//! PostgreSQL connection backend.

use std::ops::{Deref, DerefMut};

use async_trait::async_trait;
use sqlx::{Connection, PgConnection};

use crate::pool::Backend;

/// One native PostgreSQL connection, pooled by [`ConnectionPool`].
///
/// Dereferences to the underlying [`sqlx::PgConnection`] so leases can be
/// used directly as query executors.
///
/// [`ConnectionPool`]: crate::pool::ConnectionPool
pub struct PgConn {
    conn: PgConnection,
}

#[async_trait]
impl Backend for PgConn {
    type Config = String;
    type Error = sqlx::Error;

    async fn connect(url: &String) -> Result<Self, sqlx::Error> {
        let conn = PgConnection::connect(url).await?;
        Ok(Self { conn })
    }

    async fn close(self) {
        if let Err(err) = self.conn.close().await {
            tracing::debug!(error = %err, "postgres connection did not close cleanly");
        }
    }
}

impl Deref for PgConn {
    type Target = PgConnection;

    fn deref(&self) -> &PgConnection {
        &self.conn
    }
}

impl DerefMut for PgConn {
    fn deref_mut(&mut self) -> &mut PgConnection {
        &mut self.conn
    }
}
