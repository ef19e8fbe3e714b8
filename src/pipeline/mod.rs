//! Conversion pipeline: batch loop, worker fan-out, per-item stages.

pub mod batch;
pub mod item;

use std::sync::Arc;

use tracing::{error, info};

use crate::config::Config;
use crate::error::Result;
use crate::ledger::DbPool;
use crate::remote::RemoteHostClient;

pub use batch::{run_batch, BatchOutcome};
pub use item::ItemOutcome;

/// Shared dependencies handed to every pipeline stage.
pub struct PipelineContext {
    pub config: Config,
    pub client: RemoteHostClient,
    pub pool: DbPool,
}

/// Drive batches until the backlog drains (single-shot) or forever
/// (continuous). Loop-level errors back off and retry rather than
/// terminate, so a transient ledger or egress failure cannot stop the
/// service.
pub async fn run(ctx: Arc<PipelineContext>) -> Result<()> {
    let continuous = ctx.config.pipeline.continuous;

    loop {
        match run_batch(ctx.clone()).await {
            Ok(outcome) if outcome.total() == 0 => {
                if !continuous {
                    info!("Backlog empty, exiting");
                    return Ok(());
                }
                info!(
                    "Backlog empty, idling for {}s",
                    ctx.config.pipeline.idle_delay_secs
                );
                tokio::time::sleep(ctx.config.pipeline.idle_delay()).await;
            }
            Ok(outcome) => {
                info!(
                    "Batch finished: {} converted, {} failed",
                    outcome.completed, outcome.failed
                );
                if !continuous {
                    return Ok(());
                }
                tokio::time::sleep(ctx.config.pipeline.loop_delay()).await;
            }
            Err(e) => {
                if !continuous {
                    return Err(e);
                }
                error!(
                    "Batch error, backing off for {}s: {e}",
                    ctx.config.pipeline.error_backoff_secs
                );
                tokio::time::sleep(ctx.config.pipeline.error_backoff()).await;
            }
        }
    }
}
