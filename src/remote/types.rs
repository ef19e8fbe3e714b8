//! Wire types for the remote file-hosting API.

use serde::Deserialize;
use std::collections::BTreeMap;

/// Envelope every API response arrives in: `{status, data}`.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    pub status: String,
    pub data: Option<T>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AccountData {
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ServerListData {
    pub servers: Vec<ServerEntry>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ServerEntry {
    pub name: String,
}

/// Content tree resolved for one content id. Links and tokens inside are
/// account-scoped and short-lived, so trees are resolved fresh per run.
#[derive(Debug, Deserialize)]
pub struct RemoteContent {
    #[serde(default)]
    pub children: BTreeMap<String, ContentEntry>,
}

/// One entry inside a content tree.
#[derive(Debug, Clone, Deserialize)]
pub struct ContentEntry {
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    #[serde(default)]
    pub size: u64,
    pub link: Option<String>,
    pub mimetype: Option<String>,
    pub id: Option<String>,
}

impl ContentEntry {
    pub fn is_file(&self) -> bool {
        self.kind == "file"
    }

    /// True when the entry name carries a known video extension.
    pub fn is_video(&self) -> bool {
        has_extension(&self.name, &["mkv", "mp4", "avi"])
    }

    /// True when the file is already in the delivery container and needs no
    /// transcode.
    pub fn is_web_compatible(&self) -> bool {
        has_extension(&self.name, &["mp4"])
    }
}

impl RemoteContent {
    /// The principal video file: first child (in tree order) that is a file
    /// with a video extension.
    pub fn principal_video(&self) -> Option<&ContentEntry> {
        self.children
            .values()
            .find(|entry| entry.is_file() && entry.is_video())
    }
}

fn has_extension(name: &str, extensions: &[&str]) -> bool {
    name.rsplit_once('.')
        .map(|(_, ext)| extensions.iter().any(|e| ext.eq_ignore_ascii_case(e)))
        .unwrap_or(false)
}

/// Descriptor returned by a successful upload.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadedFile {
    #[serde(rename = "downloadPage")]
    pub download_page: String,
    #[serde(rename = "fileId")]
    pub file_id: String,
}
