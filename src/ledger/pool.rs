//! Work ledger connection pool.
//!
//! SQLite via r2d2 with foreign keys enabled on every connection and
//! migrations run at pool initialization.

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::error::{Error, Result};
use crate::ledger::migrations;

/// Type alias for the ledger connection pool.
pub type DbPool = Pool<SqliteConnectionManager>;

/// Type alias for a pooled ledger connection.
pub type PooledConnection = r2d2::PooledConnection<SqliteConnectionManager>;

/// Initialize the ledger pool backed by a file, running migrations.
pub fn init_pool(db_path: &str) -> Result<DbPool> {
    let manager = SqliteConnectionManager::file(db_path).with_init(|conn| {
        conn.execute_batch("PRAGMA foreign_keys = ON;")
    });

    build_pool(manager)
}

/// Initialize an in-memory ledger pool for testing.
///
/// Restricted to a single connection so every pool user sees the same
/// in-memory database.
pub fn init_memory_pool() -> Result<DbPool> {
    let manager = SqliteConnectionManager::memory().with_init(|conn| {
        conn.execute_batch("PRAGMA foreign_keys = ON;")
    });

    let pool = Pool::builder()
        .max_size(1)
        .build(manager)
        .map_err(|e| Error::database(format!("Failed to create in-memory pool: {e}")))?;

    run_migrations(&pool)?;
    Ok(pool)
}

fn build_pool(manager: SqliteConnectionManager) -> Result<DbPool> {
    let pool = Pool::builder()
        .max_size(4)
        .build(manager)
        .map_err(|e| Error::database(format!("Failed to create connection pool: {e}")))?;

    run_migrations(&pool)?;
    Ok(pool)
}

fn run_migrations(pool: &DbPool) -> Result<()> {
    let conn = pool
        .get()
        .map_err(|e| Error::database(format!("Failed to get connection for migrations: {e}")))?;

    migrations::run_migrations(&conn)
        .map_err(|e| Error::database(format!("Failed to run migrations: {e}")))
}

/// Get a connection from the pool, mapping the r2d2 error.
pub fn get_conn(pool: &DbPool) -> Result<PooledConnection> {
    pool.get()
        .map_err(|e| Error::database(format!("Failed to get connection from pool: {e}")))
}
