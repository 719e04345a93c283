//! SQLite cache store behind an r2d2 connection pool.

use crate::domain::error::TraderError;
use crate::domain::settings::CacheSettings;
use crate::ports::cache_port::CacheStore;
use chrono::Utc;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, OptionalExtension};
use std::fs;

pub struct SqliteCacheStore {
    pool: Pool<SqliteConnectionManager>,
}

fn pool_error(e: r2d2::Error) -> TraderError {
    TraderError::CacheStore {
        reason: e.to_string(),
    }
}

fn query_error(e: rusqlite::Error) -> TraderError {
    TraderError::CacheStore {
        reason: e.to_string(),
    }
}

impl SqliteCacheStore {
    pub fn from_settings(settings: &CacheSettings) -> Result<Self, TraderError> {
        if let Some(parent) = settings.sqlite_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| TraderError::CacheStore {
                    reason: format!("failed to create {}: {}", parent.display(), e),
                })?;
            }
        }

        let manager = SqliteConnectionManager::file(&settings.sqlite_path);
        let pool = Pool::builder()
            .max_size(settings.pool_size)
            .build(manager)
            .map_err(pool_error)?;

        let store = Self { pool };
        store.initialize_schema()?;
        Ok(store)
    }

    pub fn in_memory() -> Result<Self, TraderError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(pool_error)?;

        let store = Self { pool };
        store.initialize_schema()?;
        Ok(store)
    }

    pub fn initialize_schema(&self) -> Result<(), TraderError> {
        self.connection()?
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS cache_entries (
                    key TEXT PRIMARY KEY,
                    value BLOB NOT NULL,
                    written_at TEXT NOT NULL
                );",
            )
            .map_err(query_error)
    }

    /// Number of cached entries whose key starts with `prefix`.
    pub fn count_prefix(&self, prefix: &str) -> Result<usize, TraderError> {
        let count: i64 = self
            .connection()?
            .query_row(
                "SELECT COUNT(*) FROM cache_entries WHERE substr(key, 1, length(?1)) = ?1",
                params![prefix],
                |row| row.get(0),
            )
            .map_err(query_error)?;
        Ok(count as usize)
    }

    fn connection(&self) -> Result<PooledConnection<SqliteConnectionManager>, TraderError> {
        self.pool.get().map_err(pool_error)
    }
}

impl CacheStore for SqliteCacheStore {
    fn exists(&self, key: &str) -> Result<bool, TraderError> {
        let found: Option<i64> = self
            .connection()?
            .query_row(
                "SELECT 1 FROM cache_entries WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .map_err(query_error)?;
        Ok(found.is_some())
    }

    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, TraderError> {
        self.connection()?
            .query_row(
                "SELECT value FROM cache_entries WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .map_err(query_error)
    }

    fn write(&self, key: &str, value: &[u8]) -> Result<(), TraderError> {
        self.connection()?
            .execute(
                "INSERT OR REPLACE INTO cache_entries (key, value, written_at)
                 VALUES (?1, ?2, ?3)",
                params![key, value, Utc::now().to_rfc3339()],
            )
            .map_err(query_error)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), TraderError> {
        self.connection()?
            .execute("DELETE FROM cache_entries WHERE key = ?1", params![key])
            .map_err(query_error)?;
        Ok(())
    }
}
