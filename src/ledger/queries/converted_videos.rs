//! Converted-video record operations.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use crate::error::{Error, Result};
use crate::ledger::models::{ConvertedVideo, WorkItem};

/// Upsert the conversion outcome for a release. A re-conversion replaces
/// the published URL and refreshes the timestamp; presence itself is keyed
/// by the unique release id.
pub fn upsert(
    conn: &Connection,
    item: &WorkItem,
    filename: &str,
    remote_url: &str,
    remote_content_id: &str,
) -> Result<()> {
    conn.execute(
        "INSERT INTO converted_videos
             (release_id, anime_title, original_filename, remote_url, remote_content_id, converted_at)
         VALUES (?, ?, ?, ?, ?, ?)
         ON CONFLICT(release_id) DO UPDATE SET
             remote_url = excluded.remote_url,
             remote_content_id = excluded.remote_content_id,
             original_filename = excluded.original_filename,
             converted_at = excluded.converted_at",
        params![
            item.release_id,
            item.anime_title,
            filename,
            remote_url,
            remote_content_id,
            Utc::now().to_rfc3339(),
        ],
    )
    .map_err(|e| Error::database(e.to_string()))?;

    Ok(())
}

/// Register an already-compatible release without touching an existing row.
pub fn register_existing(
    conn: &Connection,
    item: &WorkItem,
    filename: &str,
    remote_url: &str,
    remote_content_id: &str,
) -> Result<()> {
    conn.execute(
        "INSERT INTO converted_videos
             (release_id, anime_title, original_filename, remote_url, remote_content_id, converted_at)
         VALUES (?, ?, ?, ?, ?, ?)
         ON CONFLICT(release_id) DO NOTHING",
        params![
            item.release_id,
            item.anime_title,
            filename,
            remote_url,
            remote_content_id,
            Utc::now().to_rfc3339(),
        ],
    )
    .map_err(|e| Error::database(e.to_string()))?;

    Ok(())
}

/// Fetch the converted row for a release, if any.
pub fn get_by_release(conn: &Connection, release_id: i64) -> Result<Option<ConvertedVideo>> {
    match conn.query_row(
        "SELECT id, release_id, anime_title, original_filename, remote_url,
                remote_content_id, converted_at
         FROM converted_videos WHERE release_id = ?",
        [release_id],
        |row| {
            Ok(ConvertedVideo {
                id: row.get(0)?,
                release_id: row.get(1)?,
                anime_title: row.get(2)?,
                original_filename: row.get(3)?,
                remote_url: row.get(4)?,
                remote_content_id: row.get(5)?,
                converted_at: DateTime::parse_from_rfc3339(&row.get::<_, String>(6)?)
                    .map(|dt| dt.with_timezone(&Utc))
                    .unwrap_or_else(|_| Utc::now()),
            })
        },
    ) {
        Ok(record) => Ok(Some(record)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(Error::database(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::pool::init_memory_pool;

    fn item() -> WorkItem {
        WorkItem {
            release_id: 9,
            remote_url: "https://host/d/src".into(),
            anime_title: "Show".into(),
            release_name: Some("ep09.mkv".into()),
            anime_id: 1,
        }
    }

    fn seed(conn: &Connection) {
        conn.execute("INSERT INTO animes (id, title) VALUES (1, 'Show')", [])
            .unwrap();
        conn.execute(
            "INSERT INTO releases (id, anime_id, remote_url) VALUES (9, 1, 'https://host/d/src')",
            [],
        )
        .unwrap();
    }

    #[test]
    fn upsert_updates_existing_row_instead_of_duplicating() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();
        seed(&conn);

        upsert(&conn, &item(), "ep09.mp4", "https://host/d/v1", "f1").unwrap();
        let first = get_by_release(&conn, 9).unwrap().unwrap();

        upsert(&conn, &item(), "ep09.mp4", "https://host/d/v2", "f2").unwrap();
        let second = get_by_release(&conn, 9).unwrap().unwrap();

        assert_eq!(first.id, second.id, "row replaced in place");
        assert_eq!(second.remote_url, "https://host/d/v2");
        assert_eq!(second.remote_content_id, "f2");

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM converted_videos", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn register_existing_does_not_overwrite() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();
        seed(&conn);

        upsert(&conn, &item(), "ep09.mp4", "https://host/d/converted", "f1").unwrap();
        register_existing(&conn, &item(), "ep09.mp4", "https://host/d/original", "src").unwrap();

        let row = get_by_release(&conn, 9).unwrap().unwrap();
        assert_eq!(row.remote_url, "https://host/d/converted");
    }

    #[test]
    fn missing_release_yields_none() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();
        assert!(get_by_release(&conn, 404).unwrap().is_none());
    }
}
