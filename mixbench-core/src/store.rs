//! Record access over the relational pool.

use serde::Serialize;

use crate::backend::PgConn;
use crate::error::StoreError;
use crate::pool::ConnectionPool;

/// One row of the `items` table. Created by insertion, immutable after;
/// identity is the store-assigned `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Record {
    pub id: i64,
    pub payload: String,
}

/// Stateless facade over the Postgres pool: one lease per call, single
/// autocommitted statements, no transactions.
#[derive(Debug, Clone)]
pub struct RecordStore {
    pool: ConnectionPool<PgConn>,
}

impl RecordStore {
    pub fn new(pool: ConnectionPool<PgConn>) -> Self {
        Self { pool }
    }

    /// Point lookup by id. `None` when no row matches — absence is a
    /// normal result, not an error.
    pub async fn get_one(&self, id: i64) -> Result<Option<Record>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let result = sqlx::query_as::<_, Record>("SELECT id, payload FROM items WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut **conn)
            .await;
        match result {
            Ok(row) => Ok(row),
            Err(err) => {
                // A failed call can leave the connection in an unknown
                // protocol state; do not reuse it.
                conn.invalidate();
                Err(err.into())
            }
        }
    }

    /// Insert a new record and return the store-assigned id.
    pub async fn insert(&self, payload: &str) -> Result<i64, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let result =
            sqlx::query_scalar::<_, i64>("INSERT INTO items (payload) VALUES ($1) RETURNING id")
                .bind(payload)
                .fetch_one(&mut **conn)
                .await;
        match result {
            Ok(id) => Ok(id),
            Err(err) => {
                conn.invalidate();
                Err(err.into())
            }
        }
    }
}
