//! Response cache persisted in a `DuckDB` file.
//!
//! Survives process restarts, which lets several short-lived server
//! processes on one host share warmed responses.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use duckdb::Connection;

use crate::{CacheError, CacheStore};

impl From<duckdb::Error> for CacheError {
    fn from(e: duckdb::Error) -> Self {
        Self::Backend(e.to_string())
    }
}

/// A [`CacheStore`] backed by a `DuckDB` table.
pub struct DuckDbCache {
    conn: Mutex<Connection>,
}

impl DuckDbCache {
    /// Opens (or creates) the cache database at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if the parent directory, connection, or
    /// schema cannot be created.
    pub fn open(path: &Path) -> Result<Self, CacheError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| CacheError::Backend(format!("{}: {e}", parent.display())))?;
        }
        Self::with_connection(Connection::open(path)?)
    }

    /// Opens a cache that lives only as long as this value.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if the schema cannot be created.
    pub fn open_in_memory() -> Result<Self, CacheError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, CacheError> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS response_cache (
                cache_key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                expires_at BIGINT NOT NULL
            );",
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, CacheError> {
        self.conn
            .lock()
            .map_err(|_| CacheError::Unavailable("duckdb cache lock poisoned".to_string()))
    }
}

fn now_seconds() -> i64 {
    chrono::Utc::now().timestamp()
}

impl CacheStore for DuckDbCache {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let conn = self.lock()?;
        match conn.query_row(
            "SELECT value FROM response_cache WHERE cache_key = ? AND expires_at > ?",
            duckdb::params![key, now_seconds()],
            |row| row.get::<_, String>(0),
        ) {
            Ok(value) => Ok(Some(value)),
            Err(duckdb::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let ttl = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        let expires_at = now_seconds().saturating_add(ttl);
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO response_cache (cache_key, value, expires_at) VALUES (?, ?, ?)",
            duckdb::params![key, value, expires_at],
        )?;
        conn.execute(
            "DELETE FROM response_cache WHERE expires_at <= ?",
            duckdb::params![now_seconds()],
        )?;
        Ok(())
    }

    fn clear(&self) -> Result<(), CacheError> {
        self.lock()?.execute_batch("DELETE FROM response_cache;")?;
        Ok(())
    }

    fn ping(&self) -> Result<(), CacheError> {
        self.lock()?
            .query_row("SELECT 1", [], |row| row.get::<_, i32>(0))?;
        Ok(())
    }
}
