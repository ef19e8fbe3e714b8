//! Work ledger schema migrations.
//!
//! Migrations are embedded in the binary and executed in order. The ledger
//! shares `animes`/`releases` with the publishing side; `converted_videos`
//! and `subtitles` are owned by the converter.

use rusqlite::Connection;

use crate::error::{Error, Result};

struct Migration {
    version: usize,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial",
    sql: "
        CREATE TABLE IF NOT EXISTS animes (
            id INTEGER PRIMARY KEY,
            title TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS releases (
            id INTEGER PRIMARY KEY,
            anime_id INTEGER NOT NULL REFERENCES animes(id),
            original_filename TEXT,
            resolution TEXT,
            remote_url TEXT
        );

        CREATE TABLE IF NOT EXISTS converted_videos (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            release_id INTEGER NOT NULL UNIQUE,
            anime_title TEXT NOT NULL,
            original_filename TEXT NOT NULL,
            remote_url TEXT NOT NULL,
            remote_content_id TEXT NOT NULL,
            converted_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS subtitles (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            release_id INTEGER NOT NULL,
            anime_id INTEGER NOT NULL,
            language TEXT NOT NULL,
            format TEXT NOT NULL DEFAULT 'vtt',
            remote_url TEXT NOT NULL,
            source TEXT NOT NULL,
            UNIQUE(release_id, language, source)
        );

        CREATE INDEX IF NOT EXISTS idx_releases_anime ON releases(anime_id);
        CREATE INDEX IF NOT EXISTS idx_subtitles_release ON subtitles(release_id);
    ",
}];

fn init_migrations_table(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY NOT NULL,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        [],
    )?;
    Ok(())
}

fn current_version(conn: &Connection) -> rusqlite::Result<usize> {
    conn.query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
        row.get::<_, Option<usize>>(0)
    })
    .map(|v| v.unwrap_or(0))
}

/// Run all pending migrations in order.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    init_migrations_table(conn).map_err(|e| Error::database(e.to_string()))?;
    let version = current_version(conn).map_err(|e| Error::database(e.to_string()))?;

    for migration in MIGRATIONS.iter().filter(|m| m.version > version) {
        conn.execute_batch(migration.sql).map_err(|e| {
            Error::database(format!("migration {} ({}) failed: {e}", migration.version, migration.name))
        })?;

        conn.execute(
            "INSERT INTO schema_migrations (version, name) VALUES (?, ?)",
            rusqlite::params![migration.version, migration.name],
        )
        .map_err(|e| Error::database(e.to_string()))?;

        tracing::debug!("Applied ledger migration {} ({})", migration.version, migration.name);
    }

    Ok(())
}
