//! Work selection queries.

use rusqlite::Connection;

use crate::error::{Error, Result};
use crate::ledger::models::WorkItem;

/// Sample up to `limit` pending releases: non-empty remote URL, no
/// converted row yet. Random order spreads concurrent converters over the
/// backlog instead of contending on its head.
pub fn pending_batch(conn: &Connection, limit: usize) -> Result<Vec<WorkItem>> {
    let mut stmt = conn
        .prepare(
            "SELECT r.id, r.remote_url, a.title, r.original_filename, a.id
             FROM releases r
             JOIN animes a ON r.anime_id = a.id
             LEFT JOIN converted_videos cv ON r.id = cv.release_id
             WHERE r.remote_url IS NOT NULL AND r.remote_url != '' AND cv.id IS NULL
             ORDER BY RANDOM() LIMIT ?",
        )
        .map_err(|e| Error::database(e.to_string()))?;

    let items = stmt
        .query_map([limit], |row| {
            Ok(WorkItem {
                release_id: row.get(0)?,
                remote_url: row.get(1)?,
                anime_title: row.get(2)?,
                release_name: row.get(3)?,
                anime_id: row.get(4)?,
            })
        })
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(|e| Error::database(e.to_string()))?;

    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::pool::init_memory_pool;
    use crate::ledger::queries::converted_videos;

    fn seed_release(conn: &Connection, release_id: i64, url: &str) {
        conn.execute(
            "INSERT OR IGNORE INTO animes (id, title) VALUES (1, 'Show')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO releases (id, anime_id, original_filename, remote_url)
             VALUES (?, 1, 'ep.mkv', ?)",
            rusqlite::params![release_id, url],
        )
        .unwrap();
    }

    #[test]
    fn excludes_empty_urls_and_converted_releases() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();

        seed_release(&conn, 1, "https://host/d/aaa");
        seed_release(&conn, 2, "");
        seed_release(&conn, 3, "https://host/d/ccc");

        let item3 = WorkItem {
            release_id: 3,
            remote_url: "https://host/d/ccc".into(),
            anime_title: "Show".into(),
            release_name: Some("ep.mkv".into()),
            anime_id: 1,
        };
        converted_videos::upsert(&conn, &item3, "ep.mp4", "https://host/d/new", "f1").unwrap();

        let batch = pending_batch(&conn, 10).unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].release_id, 1);
        assert_eq!(batch[0].anime_title, "Show");
    }

    #[test]
    fn respects_limit() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();
        for i in 1..=5 {
            seed_release(&conn, i, "https://host/d/x");
        }
        assert_eq!(pending_batch(&conn, 3).unwrap().len(), 3);
    }
}
