//! Storage-specific error type wrapping sqlx errors.

use mycohub_domain::error::MycoError;

const SQLITE_BUSY: i32 = 5;
const SQLITE_LOCKED: i32 = 6;

/// Errors originating from the `SQLite` storage layer.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// A query or connection failed.
    #[error("database error")]
    Database(#[from] sqlx::Error),

    /// Failed to run migrations.
    #[error("migration error")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl StorageError {
    /// Whether the failure is lock contention another writer will release.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        let Self::Database(sqlx::Error::Database(db_err)) = self else {
            return false;
        };
        // SQLite reports extended codes; the primary code is the low byte.
        let primary = db_err
            .code()
            .and_then(|code| code.parse::<i32>().ok())
            .map(|code| code & 0xff);
        if let Some(code) = primary {
            return code == SQLITE_BUSY || code == SQLITE_LOCKED;
        }
        let message = db_err.message();
        message.contains("database is locked") || message.contains("is busy")
    }
}

impl From<StorageError> for MycoError {
    fn from(err: StorageError) -> Self {
        if err.is_busy() {
            Self::Busy(Box::new(err))
        } else {
            Self::Storage(Box::new(err))
        }
    }
}
