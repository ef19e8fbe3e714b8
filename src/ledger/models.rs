//! Ledger row models.

use chrono::{DateTime, Utc};

/// One release pending conversion. Immutable input to a pipeline run.
#[derive(Debug, Clone)]
pub struct WorkItem {
    pub release_id: i64,
    /// Source locator; the remote content id is its last path segment.
    pub remote_url: String,
    pub anime_title: String,
    pub release_name: Option<String>,
    pub anime_id: i64,
}

impl WorkItem {
    /// Remote content id embedded in the source URL.
    pub fn content_id(&self) -> Option<&str> {
        self.remote_url
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .filter(|s| !s.is_empty())
    }

    /// Short display name for log attribution.
    pub fn display_name(&self) -> String {
        let name = self
            .release_name
            .as_deref()
            .unwrap_or(&self.remote_url);
        name.chars().take(40).collect()
    }
}

/// Persisted outcome of one conversion. At most one row per release.
#[derive(Debug, Clone)]
pub struct ConvertedVideo {
    pub id: i64,
    pub release_id: i64,
    pub anime_title: String,
    pub original_filename: String,
    pub remote_url: String,
    pub remote_content_id: String,
    pub converted_at: DateTime<Utc>,
}

/// Persisted outcome of one extracted-and-uploaded subtitle stream.
#[derive(Debug, Clone)]
pub struct SubtitleRow {
    pub id: i64,
    pub release_id: i64,
    pub anime_id: i64,
    pub language: String,
    pub format: String,
    pub remote_url: String,
    pub source: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(url: &str) -> WorkItem {
        WorkItem {
            release_id: 1,
            remote_url: url.to_string(),
            anime_title: "Show".to_string(),
            release_name: None,
            anime_id: 1,
        }
    }

    #[test]
    fn content_id_is_last_path_segment() {
        assert_eq!(
            item("https://gofile.io/d/Abc123").content_id(),
            Some("Abc123")
        );
        assert_eq!(
            item("https://gofile.io/d/Abc123/").content_id(),
            Some("Abc123")
        );
        assert_eq!(item("").content_id(), None);
    }

    #[test]
    fn display_name_truncates() {
        let mut i = item("https://gofile.io/d/x");
        i.release_name = Some("a".repeat(60));
        assert_eq!(i.display_name().len(), 40);
    }
}
