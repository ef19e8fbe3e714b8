//! Audio track enumeration.
//!
//! A pure projection over probe output: audio streams get sequential
//! indices over the audio-only subsequence (not their absolute container
//! index), because those indices later become `-map 0:a:<i>` selectors and
//! must match selection order exactly.

use crate::probe::MediaStreamInfo;

/// One audio track destined for the output container.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioTrack {
    /// Position within the audio-only subsequence.
    pub index: usize,
    /// Language tag; `und` when the source carries none.
    pub language: String,
    /// Display title; `Audio N` (1-based) when the source carries none.
    pub title: String,
    pub codec: String,
    pub channels: u32,
}

/// Enumerate audio tracks from probe output, in container order.
pub fn audio_tracks(info: &MediaStreamInfo) -> Vec<AudioTrack> {
    info.audio_streams()
        .enumerate()
        .map(|(i, stream)| AudioTrack {
            index: i,
            language: stream
                .language
                .clone()
                .unwrap_or_else(|| "und".to_string()),
            title: stream
                .title
                .clone()
                .unwrap_or_else(|| format!("Audio {}", i + 1)),
            codec: stream.codec.clone(),
            channels: stream.channels.unwrap_or(2),
        })
        .collect()
}
