//! The `SQLite` store shared by every repository implementation.
//!
//! Each method runs on a connection borrowed from the pool for that call
//! only; nothing is held between calls.

use std::str::FromStr;

use sqlx::SqlitePool;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use mycohub_domain::client::ClientId;
use mycohub_domain::time::{self, Timestamp};

/// `SQLite`-backed implementation of all storage ports.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pub(crate) pool: SqlitePool,
}

impl SqliteStore {
    /// Create a new store using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

pub(crate) fn decode_error<E>(err: E) -> sqlx::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    sqlx::Error::Decode(Box::new(err))
}

pub(crate) fn get_client_id(row: &SqliteRow, column: &str) -> Result<ClientId, sqlx::Error> {
    let value: String = row.try_get(column)?;
    ClientId::new(value).map_err(decode_error)
}

pub(crate) fn get_timestamp(row: &SqliteRow, column: &str) -> Result<Timestamp, sqlx::Error> {
    let value: String = row.try_get(column)?;
    time::parse(&value).map_err(decode_error)
}

pub(crate) fn get_parsed<T>(row: &SqliteRow, column: &str) -> Result<T, sqlx::Error>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let value: String = row.try_get(column)?;
    value.parse().map_err(decode_error)
}

pub(crate) fn limit(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
