//! Subtitle record operations.

use rusqlite::{params, Connection};

use crate::error::{Error, Result};
use crate::ledger::models::SubtitleRow;

/// Record a published subtitle track. Re-running a conversion must not
/// duplicate tracks, so conflicts on (release_id, language, source) are
/// ignored.
pub fn insert_if_absent(
    conn: &Connection,
    release_id: i64,
    anime_id: i64,
    language: &str,
    format: &str,
    remote_url: &str,
    source: &str,
) -> Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO subtitles
             (release_id, anime_id, language, format, remote_url, source)
         VALUES (?, ?, ?, ?, ?, ?)",
        params![release_id, anime_id, language, format, remote_url, source],
    )
    .map_err(|e| Error::database(e.to_string()))?;

    Ok(())
}

pub fn list_for_release(conn: &Connection, release_id: i64) -> Result<Vec<SubtitleRow>> {
    let mut stmt = conn
        .prepare(
            "SELECT id, release_id, anime_id, language, format, remote_url, source
             FROM subtitles WHERE release_id = ? ORDER BY id",
        )
        .map_err(|e| Error::database(e.to_string()))?;

    let rows = stmt
        .query_map([release_id], |row| {
            Ok(SubtitleRow {
                id: row.get(0)?,
                release_id: row.get(1)?,
                anime_id: row.get(2)?,
                language: row.get(3)?,
                format: row.get(4)?,
                remote_url: row.get(5)?,
                source: row.get(6)?,
            })
        })
        .map_err(|e| Error::database(e.to_string()))?;

    let mut out = Vec::new();
    for row in rows {
        out.push(row.map_err(|e| Error::database(e.to_string()))?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::pool::init_memory_pool;

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
    fn duplicate_track_is_ignored() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();
        seed(&conn);

        insert_if_absent(&conn, 9, 1, "eng", "vtt", "https://host/d/s1", "embedded").unwrap();
        insert_if_absent(&conn, 9, 1, "eng", "vtt", "https://host/d/s1-dup", "embedded").unwrap();
        insert_if_absent(&conn, 9, 1, "por", "vtt", "https://host/d/s2", "embedded").unwrap();

        let rows = list_for_release(&conn, 9).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].language, "eng");
        assert_eq!(rows[0].remote_url, "https://host/d/s1");
        assert_eq!(rows[1].language, "por");
    }

    #[test]
    fn same_language_tracks_with_distinct_sources_both_recorded() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();
        seed(&conn);

        // One release routinely carries two eng tracks that differ only by
        // stream title, e.g. a full dialogue track and a signs track.
        insert_if_absent(&conn, 9, 1, "eng", "vtt", "https://host/d/full", "Full").unwrap();
        insert_if_absent(&conn, 9, 1, "eng", "vtt", "https://host/d/signs", "Signs & Songs")
            .unwrap();

        let rows = list_for_release(&conn, 9).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].source, "Full");
        assert_eq!(rows[1].source, "Signs & Songs");
    }
}
