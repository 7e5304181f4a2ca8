//! mixbench-server binary — the composition root.
//!
//! Owns every long-lived resource explicitly: reads configuration, opens
//! both connection pools, ensures the schema, serves until a shutdown
//! signal, then closes the pools. Nothing here is reachable as a global.

use std::net::SocketAddr;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use mixbench_core::{
    Config, ConnectionPool, KeyValueCache, PgConn, PoolOptions, RecordStore, RedisConn,
};
use mixbench_server::{schema, serve, AppState, ServerConfig};

#[derive(Parser, Debug)]
#[command(
    name = "mixbench-server",
    about = "Benchmark REST endpoints over pooled Postgres and Redis"
)]
struct Cli {
    /// Address to bind
    #[arg(long, default_value = "0.0.0.0")]
    bind: String,

    /// Port to listen on
    #[arg(long, default_value_t = 8000)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing()?;

    let cli = Cli::parse();
    let bind_addr: SocketAddr = format!("{}:{}", cli.bind, cli.port)
        .parse()
        .context("invalid bind address")?;

    let config = Config::from_env().context("reading configuration")?;

    let db_pool = ConnectionPool::<PgConn>::connect(
        config.database_url.clone(),
        PoolOptions::new(config.database_pool_size),
    )
    .await
    .context("connecting to the database")?;

    let cache_pool = ConnectionPool::<RedisConn>::connect(
        config.redis_url.clone(),
        PoolOptions::new(config.redis_pool_size),
    )
    .await
    .context("connecting to redis")?;

    schema::ensure_schema(&db_pool)
        .await
        .context("ensuring schema")?;

    let state = AppState::new(
        RecordStore::new(db_pool.clone()),
        KeyValueCache::new(cache_pool.clone()),
    );

    serve(ServerConfig { bind_addr }, state).await?;

    // Graceful shutdown has drained the handlers; every lease is back.
    db_pool.close().await.context("closing database pool")?;
    cache_pool.close().await.context("closing cache pool")?;
    Ok(())
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .compact()
        .try_init()
        .map_err(|err| anyhow!(err))
}
