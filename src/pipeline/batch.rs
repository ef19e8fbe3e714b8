//! Batch execution over a bounded worker pool.
//!
//! A semaphore caps in-flight items; spawning blocks on a permit, so at
//! most `workers` items run at once and the JoinSet never holds more than
//! that many live tasks plus the queue of finished ones.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::error::Result;
use crate::ledger::queries::work_items;
use crate::ledger::{get_conn, WorkItem};
use crate::pipeline::{item, PipelineContext};

/// Tally for one batch.
#[derive(Debug, Default, Clone, Copy)]
pub struct BatchOutcome {
    pub completed: usize,
    pub failed: usize,
}

impl BatchOutcome {
    pub fn total(&self) -> usize {
        self.completed + self.failed
    }
}

/// Pull one batch from the ledger and run it to completion.
pub async fn run_batch(ctx: Arc<PipelineContext>) -> Result<BatchOutcome> {
    let items = {
        let conn = get_conn(&ctx.pool)?;
        work_items::pending_batch(&conn, ctx.config.pipeline.batch_size)?
    };

    if items.is_empty() {
        return Ok(BatchOutcome::default());
    }

    let workers = ctx.config.pipeline.workers;
    info!("Batch of {} items, {} workers", items.len(), workers);

    let outcome = fan_out(items, workers, |work, worker_id| {
        let ctx = ctx.clone();
        async move {
            let name = work.display_name();

            match item::process_item(&ctx, &work, worker_id).await {
                Ok(outcome) => {
                    info!("[W{worker_id}] Done '{name}' ({outcome:?})");
                    true
                }
                Err(e) => {
                    warn!("[W{worker_id}] Failed '{name}': {e}");
                    false
                }
            }
        }
    })
    .await;

    Ok(outcome)
}

/// Spawn one task per item, at most `workers` in flight. Spawning blocks
/// on an owned permit, so the permit count is the hard concurrency ceiling;
/// the JoinSet is drained to completion before returning.
async fn fan_out<F, Fut>(items: Vec<WorkItem>, workers: usize, job: F) -> BatchOutcome
where
    F: Fn(WorkItem, usize) -> Fut,
    Fut: std::future::Future<Output = bool> + Send + 'static,
{
    let semaphore = Arc::new(Semaphore::new(workers));
    let mut tasks = JoinSet::new();

    for (idx, work) in items.into_iter().enumerate() {
        let Ok(permit) = semaphore.clone().acquire_owned().await else {
            break;
        };

        let worker_id = idx % workers + 1;
        let fut = job(work, worker_id);

        tasks.spawn(async move {
            let _permit = permit;
            fut.await
        });
    }

    let mut outcome = BatchOutcome::default();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(true) => outcome.completed += 1,
            Ok(false) => outcome.failed += 1,
            Err(e) => {
                warn!("Worker task aborted: {e}");
                outcome.failed += 1;
            }
        }
    }

    outcome
}
