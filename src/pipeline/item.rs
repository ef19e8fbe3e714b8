//! Per-item conversion pipeline.
//!
//! One invocation takes a work item end to end: resolve the content tree,
//! download the principal video, extract subtitles, transcode, publish the
//! result and record it in the ledger. Failures in any required step are
//! fatal to the item only; the batch runner keeps going.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::ledger::models::WorkItem;
use crate::ledger::queries::{converted_videos, subtitles};
use crate::ledger::get_conn;
use crate::media::{self, audio_tracks, extract_subtitles, transcode, SubtitleAsset};
use crate::pipeline::PipelineContext;
use crate::probe;
use crate::remote::ContentEntry;

/// How one work item was settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemOutcome {
    /// Downloaded, transcoded and republished.
    Converted,
    /// Already in the delivery container; recorded under its existing URL.
    Registered,
}

/// Scratch files owned by one pipeline run. Dropping the scope deletes
/// whatever is still on disk, so early returns and errors never leak temp
/// files.
struct TempScope {
    paths: Vec<PathBuf>,
}

impl TempScope {
    fn new() -> Self {
        Self { paths: Vec::new() }
    }

    fn track(&mut self, path: &Path) {
        self.paths.push(path.to_path_buf());
    }
}

impl Drop for TempScope {
    fn drop(&mut self) {
        for path in &self.paths {
            if std::fs::remove_file(path).is_ok() {
                debug!("Removed scratch file {:?}", path);
            }
        }
    }
}

/// Published name for the converted file: the source name with its
/// extension rewritten to the delivery container.
fn delivery_file_name(source: &str) -> String {
    match source.rsplit_once('.') {
        Some((stem, _)) => format!("{stem}.mp4"),
        None => format!("{source}.mp4"),
    }
}

/// Run one work item through the pipeline.
pub async fn process_item(
    ctx: &PipelineContext,
    item: &WorkItem,
    worker_id: usize,
) -> Result<ItemOutcome> {
    let content_id = item
        .content_id()
        .ok_or_else(|| Error::not_found(format!("no content id in '{}'", item.remote_url)))?;

    let token = ctx.client.create_account().await?;
    let content = ctx.client.get_content(content_id, &token).await?;

    let principal = content
        .principal_video()
        .ok_or_else(|| Error::not_found(format!("no video file under content {content_id}")))?
        .clone();

    if principal.is_web_compatible() {
        return register_compatible(ctx, item, &principal, content_id);
    }

    let link = principal
        .link
        .clone()
        .ok_or_else(|| Error::not_found(format!("no download link for '{}'", principal.name)))?;

    let temp_dir = &ctx.config.pipeline.temp_dir;
    let input = temp_dir.join(format!("w{worker_id}_{}.mkv", item.release_id));
    let output = temp_dir.join(format!("w{worker_id}_{}.mp4", item.release_id));

    let mut scope = TempScope::new();
    scope.track(&input);
    scope.track(&output);

    info!(
        "[W{worker_id}] Downloading '{}' ({})",
        item.display_name(),
        media::format_bytes(principal.size)
    );
    ctx.client.download(&link, &token, &input).await?;

    let stream_info = probe::probe(&input, &ctx.config.tools).await;

    let subtitle_assets = if ctx.config.pipeline.extract_subtitles {
        let assets = extract_subtitles(
            &stream_info,
            &input,
            temp_dir,
            worker_id,
            item.release_id,
            &ctx.config.tools,
        )
        .await;
        for asset in &assets {
            scope.track(&asset.path);
        }
        assets
    } else {
        Vec::new()
    };

    let mut tracks = audio_tracks(&stream_info);
    if !ctx.config.pipeline.multi_audio {
        tracks.truncate(1);
    }

    info!("[W{worker_id}] Transcoding '{}'", item.display_name());
    transcode(&input, &output, &tracks, &ctx.config.tools).await?;

    // Free the source before the upload; large batches would otherwise
    // hold both containers on disk per worker.
    let _ = tokio::fs::remove_file(&input).await;

    let servers = ctx.client.list_upload_servers().await?;
    let server = servers
        .first()
        .ok_or_else(|| Error::remote_host("no upload servers available"))?;

    let published_name = delivery_file_name(&principal.name);
    info!("[W{worker_id}] Uploading '{published_name}' to {server}");
    let uploaded = ctx.client.upload(&output, &published_name, server).await?;

    {
        let conn = get_conn(&ctx.pool)?;
        converted_videos::upsert(
            &conn,
            item,
            &published_name,
            &uploaded.download_page,
            &uploaded.file_id,
        )?;
    }

    publish_subtitles(ctx, item, &published_name, &subtitle_assets, server).await;

    Ok(ItemOutcome::Converted)
}

fn register_compatible(
    ctx: &PipelineContext,
    item: &WorkItem,
    principal: &ContentEntry,
    content_id: &str,
) -> Result<ItemOutcome> {
    info!(
        "'{}' is already browser-compatible, registering as-is",
        principal.name
    );

    let remote_content_id = principal.id.as_deref().unwrap_or(content_id);
    let conn = get_conn(&ctx.pool)?;
    converted_videos::register_existing(
        &conn,
        item,
        &principal.name,
        &item.remote_url,
        remote_content_id,
    )?;

    Ok(ItemOutcome::Registered)
}

/// Source label distinguishing same-language tracks ("Full" vs
/// "Signs & Songs"): the stream title when the container carries one,
/// `extracted` otherwise.
fn subtitle_source(asset: &SubtitleAsset) -> &str {
    if asset.title.is_empty() {
        "extracted"
    } else {
        &asset.title
    }
}

/// Upload extracted subtitle tracks and record them. Each track fails
/// independently; a bad upload is logged and skipped.
async fn publish_subtitles(
    ctx: &PipelineContext,
    item: &WorkItem,
    published_name: &str,
    assets: &[SubtitleAsset],
    server: &str,
) {
    let stem = published_name.strip_suffix(".mp4").unwrap_or(published_name);

    for asset in assets {
        let remote_name = format!("{stem}.{}.vtt", asset.language);
        let uploaded = match ctx.client.upload(&asset.path, &remote_name, server).await {
            Ok(uploaded) => uploaded,
            Err(e) => {
                warn!("Subtitle upload '{}' failed, skipping: {e}", remote_name);
                continue;
            }
        };

        let recorded = get_conn(&ctx.pool).and_then(|conn| {
            subtitles::insert_if_absent(
                &conn,
                item.release_id,
                item.anime_id,
                &asset.language,
                "vtt",
                &uploaded.download_page,
                subtitle_source(asset),
            )
        });
        if let Err(e) = recorded {
            warn!("Recording subtitle '{}' failed: {e}", remote_name);
        }
    }
}
