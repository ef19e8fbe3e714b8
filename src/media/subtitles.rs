//! Subtitle extraction to WebVTT.
//!
//! Each subtitle stream is remuxed independently under its own deadline;
//! a stream that cannot be converted (image-based codecs, corrupt data) is
//! skipped and the rest proceed. Extraction failure is never fatal to the
//! owning item.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::command::ToolCommand;
use crate::config::ToolsConfig;
use crate::probe::MediaStreamInfo;

/// One successfully extracted subtitle stream.
#[derive(Debug, Clone)]
pub struct SubtitleAsset {
    /// Index within the subtitle-only subsequence of the source.
    pub index: usize,
    pub language: String,
    pub title: String,
    pub codec: String,
    /// Extracted `.vtt` file on local disk.
    pub path: PathBuf,
}

/// File name unique per (worker, release, language, stream index) so
/// concurrent workers never collide in the shared temp directory.
pub fn subtitle_file_name(worker_id: usize, release_id: i64, language: &str, index: usize) -> String {
    format!("w{worker_id}_{release_id}_{language}_{index}.vtt")
}

/// Extract every convertible subtitle stream from `input` into `temp_dir`.
pub async fn extract_subtitles(
    info: &MediaStreamInfo,
    input: &Path,
    temp_dir: &Path,
    worker_id: usize,
    release_id: i64,
    tools: &ToolsConfig,
) -> Vec<SubtitleAsset> {
    let mut assets = Vec::new();

    for (i, stream) in info.subtitle_streams().enumerate() {
        let language = stream
            .language
            .clone()
            .unwrap_or_else(|| format!("sub{i}"));
        let out_path = temp_dir.join(subtitle_file_name(worker_id, release_id, &language, i));

        let result = ToolCommand::new(&tools.ffmpeg)
            .arg("-i")
            .arg(input.to_string_lossy())
            .arg("-map")
            .arg(format!("0:s:{i}"))
            .args(["-c:s", "webvtt", "-y"])
            .arg(out_path.to_string_lossy())
            .timeout(tools.subtitle_timeout())
            .execute()
            .await;

        if let Err(e) = result {
            debug!("Subtitle stream {i} ({language}) not convertible: {e}");
            let _ = std::fs::remove_file(&out_path);
            continue;
        }

        // ffmpeg can exit zero yet write nothing useful for some codecs.
        let non_empty = std::fs::metadata(&out_path)
            .map(|m| m.len() > 0)
            .unwrap_or(false);
        if !non_empty {
            debug!("Subtitle stream {i} ({language}) produced an empty file, skipping");
            let _ = std::fs::remove_file(&out_path);
            continue;
        }

        assets.push(SubtitleAsset {
            index: i,
            language,
            title: stream.title.clone().unwrap_or_default(),
            codec: stream.codec.clone(),
            path: out_path,
        });
    }

    assets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::parse_probe_output;

    #[test]
    fn names_are_collision_free_across_workers_and_streams() {
        let a = subtitle_file_name(1, 42, "eng", 0);
        let b = subtitle_file_name(2, 42, "eng", 0);
        let c = subtitle_file_name(1, 42, "eng", 1);
        let d = subtitle_file_name(1, 43, "eng", 0);
        assert_eq!(a, "w1_42_eng_0.vtt");
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
    }

    #[tokio::test]
    async fn unconvertible_streams_are_skipped_not_fatal() {
        // ffmpeg pointed at a missing input fails per stream; extraction
        // must swallow that and return what it could (nothing).
        let json = r#"{
            "streams": [
                {"index": 0, "codec_type": "subtitle", "codec_name": "ass",
                 "tags": {"language": "eng"}},
                {"index": 1, "codec_type": "subtitle", "codec_name": "hdmv_pgs_subtitle"}
            ],
            "format": {"format_name": "matroska"}
        }"#;
        let info = parse_probe_output(json);
        let temp = tempfile::tempdir().unwrap();

        let assets = extract_subtitles(
            &info,
            Path::new("/nonexistent/input.mkv"),
            temp.path(),
            1,
            7,
            &ToolsConfig::default(),
        )
        .await;

        assert!(assets.is_empty());
        // No leftover partial files either.
        assert_eq!(std::fs::read_dir(temp.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn no_subtitle_streams_yields_empty() {
        let info = parse_probe_output(r#"{"streams": [], "format": {}}"#);
        let temp = tempfile::tempdir().unwrap();

        let assets = extract_subtitles(
            &info,
            Path::new("/nonexistent/input.mkv"),
            temp.path(),
            1,
            7,
            &ToolsConfig::default(),
        )
        .await;

        assert!(assets.is_empty());
    }
}
