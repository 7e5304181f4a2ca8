//! Adapters implementing [`Backend`](crate::pool::Backend) for the two
//! external services: PostgreSQL for records, Redis for cached strings.

mod postgres;
mod redis;

pub use postgres::PgConn;
pub use redis::RedisConn;
