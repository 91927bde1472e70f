pub mod board;
pub mod migrations;
pub mod models;
pub mod queries;

use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, ErrorCode, ffi};
use thiserror::Error;
use tracing::info;

pub type Result<T> = std::result::Result<T, DbError>;

#[derive(Debug, Error)]
pub enum DbError {
    /// A UNIQUE constraint rejected the write. Nothing was stored.
    #[error("duplicate key: {0}")]
    DuplicateKey(String),

    #[error("sqlite error: {0}")]
    Sqlite(rusqlite::Error),

    #[error("database lock poisoned")]
    LockPoisoned,

    #[error("corrupt row: {0}")]
    Corrupt(String),
}

impl From<rusqlite::Error> for DbError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(code, msg)
                if code.code == ErrorCode::ConstraintViolation
                    && code.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE =>
            {
                DbError::DuplicateKey(msg.unwrap_or_else(|| "unique constraint".into()))
            }
            other => DbError::Sqlite(other),
        }
    }
}

/// Handle to the campus store. Constructed once at startup and shared behind
/// an `Arc`; dropping it closes the connection.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;

        // WAL mode for concurrent reads
        conn.pragma_update(None, "journal_mode", "WAL")?;

        let db = Self::init(conn)?;
        info!("Database opened at {}", path.display());
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        migrations::run(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.conn.lock().map_err(|_| DbError::LockPoisoned)?;
        f(&conn)
    }
}

impl Drop for Database {
    fn drop(&mut self) {
        info!("Database closed");
    }
}

/// Stored timestamp format. Fixed width with a `Z` suffix, so lexical order
/// is chronological order.
pub fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    raw.parse::<DateTime<Utc>>()
        .map_err(|e| DbError::Corrupt(format!("timestamp '{}': {}", raw, e)))
}
