//! Database connection management
//!
//! SQLite connection pool shared by the MCP tools.

use std::path::Path;
use std::sync::Arc;

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::OpenFlags;
use thiserror::Error;

use super::migrations::run_migrations;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("Database connection error: {0}")]
    Connection(#[from] r2d2::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Not found: {0}")]
    NotFound(String),
}

pub type DbResult<T> = Result<T, DbError>;

const POOL_SIZE: u32 = 10;

const FILE_PRAGMAS: &str = "PRAGMA foreign_keys = ON;
     PRAGMA journal_mode = WAL;
     PRAGMA synchronous = NORMAL;
     PRAGMA cache_size = -64000;
     PRAGMA temp_store = MEMORY;";

/// Pooled SQLite handle; clones share the pool
#[derive(Clone)]
pub struct Database {
    pool: Arc<Pool<SqliteConnectionManager>>,
}

impl Database {
    /// Pool over a database file, created when missing
    pub fn new<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let manager = SqliteConnectionManager::file(path)
            .with_flags(
                OpenFlags::SQLITE_OPEN_READ_WRITE
                    | OpenFlags::SQLITE_OPEN_CREATE
                    | OpenFlags::SQLITE_OPEN_URI,
            )
            .with_init(|conn| conn.execute_batch(FILE_PRAGMAS));

        let pool = Pool::builder().max_size(POOL_SIZE).build(manager)?;
        Ok(Self { pool: Arc::new(pool) })
    }

    /// Open the pool and bring the schema up to date
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let db = Self::new(path)?;
        db.with_conn(run_migrations)?;
        Ok(db)
    }

    /// Migrated private in-memory database
    ///
    /// Each in-memory SQLite connection is its own database, so the pool
    /// holds exactly one.
    pub fn in_memory() -> DbResult<Self> {
        let manager = SqliteConnectionManager::memory()
            .with_init(|conn| conn.execute_batch("PRAGMA foreign_keys = ON;"));
        let pool = Pool::builder().max_size(1).build(manager)?;
        let db = Self { pool: Arc::new(pool) };
        db.with_conn(run_migrations)?;
        Ok(db)
    }

    pub fn get_conn(&self) -> DbResult<PooledConnection<SqliteConnectionManager>> {
        Ok(self.pool.get()?)
    }

    /// Run a closure with a pooled connection
    pub fn with_conn<F, T>(&self, f: F) -> DbResult<T>
    where
        F: FnOnce(&rusqlite::Connection) -> DbResult<T>,
    {
        let conn = self.get_conn()?;
        f(&conn)
    }

    /// Run a closure with a mutable connection (for transactions)
    pub fn with_conn_mut<F, T>(&self, f: F) -> DbResult<T>
    where
        F: FnOnce(&mut rusqlite::Connection) -> DbResult<T>,
    {
        let mut conn = self.get_conn()?;
        f(&mut conn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::get_schema_version;

    #[test]
    fn test_in_memory_is_migrated() {
        let db = Database::in_memory().unwrap();
        assert!(db.with_conn(get_schema_version).unwrap() > 0);
    }

    #[test]
    fn test_clones_share_state() {
        let db = Database::in_memory().unwrap();
        let other = db.clone();
        db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO nutrition_plans (name, target_calories) VALUES ('A', 2000)",
                [],
            )?;
            Ok(())
        })
        .unwrap();
        let count: i64 = other
            .with_conn(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM nutrition_plans", [], |r| r.get(0))?))
            .unwrap();
        assert_eq!(count, 1);
    }
}
