//! Remote file-hosting protocol: account issuance, content resolution,
//! server selection, chunked upload, and cookie-authenticated download.

mod client;
mod types;

pub use client::RemoteHostClient;
pub use types::{ContentEntry, RemoteContent, UploadedFile};
