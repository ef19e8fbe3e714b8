//! FFprobe-based media inspection.
//!
//! Probing is deliberately infallible: a probe that times out, fails to
//! spawn, exits non-zero, or emits unparseable JSON degrades to an empty
//! stream list. Downstream stages treat "no streams found" as a normal
//! (if unproductive) answer.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::command::ToolCommand;
use crate::config::ToolsConfig;

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    format: Option<FfprobeFormat>,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    format_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: String,
    codec_name: Option<String>,
    channels: Option<u32>,
    #[serde(default)]
    tags: FfprobeTags,
}

#[derive(Debug, Default, Deserialize)]
struct FfprobeTags {
    language: Option<String>,
    title: Option<String>,
}

/// Kind of an individual stream inside a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamKind {
    Video,
    Audio,
    Subtitle,
    Other,
}

/// One stream descriptor from a probed container.
#[derive(Debug, Clone, Serialize)]
pub struct StreamInfo {
    pub kind: StreamKind,
    pub codec: String,
    pub language: Option<String>,
    pub title: Option<String>,
    /// Channel count; audio streams only.
    pub channels: Option<u32>,
}

/// Container-level format info plus the ordered stream list.
///
/// Derived per probe, discarded after use.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MediaStreamInfo {
    pub container: String,
    pub streams: Vec<StreamInfo>,
}

impl MediaStreamInfo {
    /// First video stream, if any.
    pub fn first_video(&self) -> Option<&StreamInfo> {
        self.streams.iter().find(|s| s.kind == StreamKind::Video)
    }

    /// Audio streams in container order.
    pub fn audio_streams(&self) -> impl Iterator<Item = &StreamInfo> {
        self.streams.iter().filter(|s| s.kind == StreamKind::Audio)
    }

    /// Subtitle streams in container order.
    pub fn subtitle_streams(&self) -> impl Iterator<Item = &StreamInfo> {
        self.streams
            .iter()
            .filter(|s| s.kind == StreamKind::Subtitle)
    }
}

/// Probe a media file. Never fails; see module docs.
pub async fn probe(path: &Path, tools: &ToolsConfig) -> MediaStreamInfo {
    let result = ToolCommand::new(&tools.ffprobe)
        .args(["-v", "quiet", "-print_format", "json", "-show_format", "-show_streams"])
        .arg(path.to_string_lossy())
        .timeout(tools.probe_timeout())
        .execute()
        .await;

    match result {
        Ok(output) => parse_probe_output(&output.stdout),
        Err(e) => {
            tracing::debug!("Probe of {:?} failed, treating as empty: {}", path, e);
            MediaStreamInfo::default()
        }
    }
}

/// Parse raw ffprobe JSON. Malformed input degrades to empty.
pub fn parse_probe_output(json: &str) -> MediaStreamInfo {
    let parsed: FfprobeOutput = match serde_json::from_str(json) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::debug!("Unparseable ffprobe output, treating as empty: {}", e);
            return MediaStreamInfo::default();
        }
    };

    let streams = parsed
        .streams
        .into_iter()
        .map(|stream| StreamInfo {
            kind: match stream.codec_type.as_str() {
                "video" => StreamKind::Video,
                "audio" => StreamKind::Audio,
                "subtitle" => StreamKind::Subtitle,
                _ => StreamKind::Other,
            },
            codec: stream.codec_name.unwrap_or_default(),
            language: stream.tags.language,
            title: stream.tags.title,
            channels: stream.channels,
        })
        .collect();

    MediaStreamInfo {
        container: parsed
            .format
            .and_then(|f| f.format_name)
            .unwrap_or_default(),
        streams,
    }
}
