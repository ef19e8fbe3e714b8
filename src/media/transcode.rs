//! Codec-aware transcode to the delivery container.
//!
//! Video is stream-copied unless the source codec is in the
//! HEVC/H.265 family, which target players cannot decode; audio is always
//! re-encoded to AAC so the output carries one consistent audio codec
//! regardless of the source mix.

use std::path::Path;

use tracing::{debug, info};

use crate::command::ToolCommand;
use crate::config::ToolsConfig;
use crate::error::Result;
use crate::media::audio::AudioTrack;
use crate::probe;

/// Ceiling on audio streams carried into one output.
pub const MAX_AUDIO_TRACKS: usize = 8;

const VIDEO_PRESET: &str = "veryfast";
const VIDEO_CRF: &str = "23";
const AUDIO_BITRATE: &str = "192k";

/// True when a video codec needs re-encoding for browser playback.
pub fn needs_reencode(codec: &str) -> bool {
    codec.contains("hevc") || codec.contains("265")
}

/// Build the full ffmpeg argument vector for one transcode.
///
/// `video_codec` is the probed codec of the first video stream; `None`
/// (probe found nothing) falls back to re-encoding, the safe choice.
pub fn build_transcode_args(
    input: &Path,
    output: &Path,
    video_codec: Option<&str>,
    audio_tracks: &[AudioTrack],
) -> Vec<String> {
    let reencode = video_codec.map(needs_reencode).unwrap_or(true);

    let mut args: Vec<String> = vec![
        "-i".into(),
        input.to_string_lossy().into_owned(),
        "-map".into(),
        "0:v:0".into(),
    ];

    let selected = audio_tracks.len().min(MAX_AUDIO_TRACKS);
    for i in 0..selected {
        args.push("-map".into());
        args.push(format!("0:a:{i}"));
    }

    if reencode {
        args.extend([
            "-c:v".into(),
            "libx264".into(),
            "-preset".into(),
            VIDEO_PRESET.into(),
            "-crf".into(),
            VIDEO_CRF.into(),
        ]);
    } else {
        args.extend(["-c:v".into(), "copy".into()]);
    }

    // Audio is always normalized, even when video is copied.
    args.extend(["-c:a".into(), "aac".into(), "-b:a".into(), AUDIO_BITRATE.into()]);

    for (i, track) in audio_tracks.iter().take(selected).enumerate() {
        args.push(format!("-metadata:s:a:{i}"));
        args.push(format!("language={}", track.language));
        if !track.title.is_empty() {
            args.push(format!("-metadata:s:a:{i}"));
            args.push(format!("title={}", track.title));
        }
    }

    // Index data up front for progressive playback.
    args.extend(["-movflags".into(), "+faststart".into()]);
    args.extend(["-y".into(), output.to_string_lossy().into_owned()]);

    args
}

/// Transcode `input` to `output`, preserving the given audio tracks.
///
/// Runs under the configured kill deadline; exceeding it terminates
/// ffmpeg. Non-zero exit or forced kill surfaces as [`crate::error::Error::Process`],
/// fatal to the owning item.
pub async fn transcode(
    input: &Path,
    output: &Path,
    audio_tracks: &[AudioTrack],
    tools: &ToolsConfig,
) -> Result<()> {
    let info = probe::probe(input, tools).await;
    let video_codec = info.first_video().map(|v| v.codec.as_str());

    if video_codec.map(needs_reencode).unwrap_or(true) {
        info!("Video codec {:?} incompatible, re-encoding to H.264", video_codec);
    }
    if audio_tracks.len() > 1 {
        info!("Carrying {} audio tracks", audio_tracks.len());
    }

    let args = build_transcode_args(input, output, video_codec, audio_tracks);
    debug!("ffmpeg args: {:?}", args);

    ToolCommand::new(&tools.ffmpeg)
        .args(args)
        .timeout(tools.transcode_timeout())
        .execute()
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn track(index: usize, language: &str, title: &str) -> AudioTrack {
        AudioTrack {
            index,
            language: language.to_string(),
            title: title.to_string(),
            codec: "flac".to_string(),
            channels: 2,
        }
    }

    fn args_for(codec: Option<&str>, tracks: &[AudioTrack]) -> Vec<String> {
        build_transcode_args(
            &PathBuf::from("/tmp/in.mkv"),
            &PathBuf::from("/tmp/out.mp4"),
            codec,
            tracks,
        )
    }

    #[test]
    fn hevc_family_triggers_reencode() {
        assert!(needs_reencode("hevc"));
        assert!(needs_reencode("x265"));
        assert!(!needs_reencode("h264"));
        assert!(!needs_reencode("vp9"));
    }

    #[test]
    fn h264_video_is_stream_copied() {
        let args = args_for(Some("h264"), &[track(0, "jpn", "")]);
        let joined = args.join(" ");
        assert!(joined.contains("-c:v copy"));
        assert!(!joined.contains("libx264"));
        // Audio still normalized.
        assert!(joined.contains("-c:a aac -b:a 192k"));
        assert!(joined.contains("-movflags +faststart"));
    }

    #[test]
    fn hevc_video_is_reencoded() {
        let args = args_for(Some("hevc"), &[]);
        let joined = args.join(" ");
        assert!(joined.contains("-c:v libx264 -preset veryfast -crf 23"));
    }

    #[test]
    fn unknown_codec_falls_back_to_reencode() {
        let joined = args_for(None, &[]).join(" ");
        assert!(joined.contains("libx264"));
    }

    #[test]
    fn audio_maps_follow_track_order_and_cap() {
        let tracks: Vec<AudioTrack> =
            (0..10).map(|i| track(i, "und", "")).collect();
        let args = args_for(Some("h264"), &tracks);

        let maps: Vec<&String> = args
            .iter()
            .filter(|a| a.starts_with("0:a:"))
            .collect();
        assert_eq!(maps.len(), MAX_AUDIO_TRACKS);
        assert_eq!(maps[0], "0:a:0");
        assert_eq!(maps[7], "0:a:7");
    }

    #[test]
    fn metadata_stamped_per_selected_track() {
        let tracks = vec![track(0, "jpn", "Original"), track(1, "por", "Dub")];
        let args = args_for(Some("h264"), &tracks);
        let joined = args.join(" ");
        assert!(joined.contains("-metadata:s:a:0 language=jpn"));
        assert!(joined.contains("-metadata:s:a:0 title=Original"));
        assert!(joined.contains("-metadata:s:a:1 language=por"));
        assert!(joined.contains("-metadata:s:a:1 title=Dub"));
    }

    #[test]
    fn empty_title_not_stamped() {
        let args = args_for(Some("h264"), &[track(0, "und", "")]);
        let joined = args.join(" ");
        assert!(joined.contains("language=und"));
        assert!(!joined.contains("title="));
    }

    #[test]
    fn output_overwrite_comes_last() {
        let args = args_for(Some("h264"), &[]);
        assert_eq!(args[args.len() - 2], "-y");
        assert_eq!(args[args.len() - 1], "/tmp/out.mp4");
    }
}
