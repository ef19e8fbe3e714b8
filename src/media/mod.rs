//! Media handling: audio enumeration, subtitle extraction, transcode.

pub mod audio;
pub mod subtitles;
pub mod transcode;

pub use audio::{audio_tracks, AudioTrack};
pub use subtitles::{extract_subtitles, SubtitleAsset};
pub use transcode::transcode;

/// Human-readable byte count for log lines.
pub fn format_bytes(bytes: u64) -> String {
    if bytes == 0 {
        "0 B".to_string()
    } else {
        format!("{:.1} MB", bytes as f64 / 1024.0 / 1024.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_bytes_examples() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(1024 * 1024), "1.0 MB");
        assert_eq!(format_bytes(1_572_864), "1.5 MB");
    }
}
