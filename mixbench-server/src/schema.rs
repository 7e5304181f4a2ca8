//! Schema bootstrap for the items table.

use mixbench_core::{ConnectionPool, PgConn, StoreError};

/// Ensure the `items` table exists. Idempotent; run once at startup,
/// before the first request is served.
pub async fn ensure_schema(pool: &ConnectionPool<PgConn>) -> Result<(), StoreError> {
    tracing::info!("ensuring items schema");
    let mut conn = pool.acquire().await?;
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS items (
            id BIGSERIAL PRIMARY KEY,
            payload TEXT NOT NULL
        )
        "#,
    )
    .execute(&mut **conn)
    .await?;
    Ok(())
}
