//! Environment configuration.
//!
//! Recognized variables:
//! - `DATABASE_URL`: Postgres connection string (required)
//! - `REDIS_URL`: Redis connection string (required)
//! - `DATABASE_POOL_SIZE`: store pool ceiling (default: 50)
//! - `REDIS_POOL_SIZE`: cache pool ceiling (default: 100)

use std::env;

use crate::error::ConfigError;

pub const DEFAULT_DATABASE_POOL_SIZE: usize = 50;
pub const DEFAULT_REDIS_POOL_SIZE: usize = 100;

/// Process configuration, read once at startup by the composition root.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub database_pool_size: usize,
    pub redis_pool_size: usize,
}

impl Config {
    /// Read configuration from the environment, failing fast on missing
    /// required values or unparsable sizes.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            database_url: require("DATABASE_URL")?,
            redis_url: require("REDIS_URL")?,
            database_pool_size: pool_size("DATABASE_POOL_SIZE", DEFAULT_DATABASE_POOL_SIZE)?,
            redis_pool_size: pool_size("REDIS_POOL_SIZE", DEFAULT_REDIS_POOL_SIZE)?,
        })
    }
}

fn require(var: &'static str) -> Result<String, ConfigError> {
    env::var(var).map_err(|_| ConfigError::Missing(var))
}

fn pool_size(var: &'static str, default: usize) -> Result<usize, ConfigError> {
    match env::var(var) {
        Ok(raw) => raw
            .parse::<usize>()
            .ok()
            .filter(|size| *size >= 1)
            .ok_or_else(|| ConfigError::Invalid {
                var,
                value: raw.clone(),
                reason: "expected a positive integer".to_owned(),
            }),
        Err(_) => Ok(default),
    }
}
