//! Periodic recovery sweep for stalled classification retries.
//!
//! The retry path normally re-enqueues its own follow-up task, but that
//! enqueue can be lost (worker crash between the state write and the
//! enqueue). The sweeper walks classifications parked in RETRY that have
//! not been touched for a full sweep interval and re-dispatches them.

use std::time::Duration;

use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

use modbot_db::repositories::ClassificationRepo;
use modbot_queue::tasks::{StageArgs, TaskSpec};
use modbot_queue::{TaskName, TaskQueue};

/// Re-dispatches classification retries whose queue task went missing.
pub struct RetrySweeper {
    pool: PgPool,
    queue: TaskQueue,
    sweep_interval: Duration,
}

impl RetrySweeper {
    pub fn new(pool: PgPool, queue: TaskQueue, sweep_interval: Duration) -> Self {
        Self {
            pool,
            queue,
            sweep_interval,
        }
    }

    /// Run the sweep loop until the cancellation token is triggered.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.sweep_interval);
        // The first tick fires immediately; skip it so a restart does not
        // race retries that are already queued with a countdown.
        ticker.tick().await;
        tracing::info!(
            sweep_interval_secs = self.sweep_interval.as_secs(),
            "Retry sweeper started",
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Retry sweeper shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.sweep().await {
                        tracing::error!(error = %e, "Retry sweep failed");
                    }
                }
            }
        }
    }

    /// One sweep: re-enqueue classification for every stalled retry row.
    async fn sweep(&self) -> Result<(), sqlx::Error> {
        let stale_secs = self.sweep_interval.as_secs() as i64;
        let comment_ids =
            ClassificationRepo::pending_retry_comment_ids(&self.pool, stale_secs).await?;
        if comment_ids.is_empty() {
            return Ok(());
        }

        let mut redispatched = 0usize;
        for comment_id in &comment_ids {
            let Some(row) = ClassificationRepo::find_by_comment(&self.pool, comment_id).await?
            else {
                continue;
            };
            // The row records the attempt that failed; the lost task would
            // have carried the next one.
            let spec = TaskSpec::new(
                TaskName::ClassifyComment,
                StageArgs {
                    comment_id: comment_id.clone(),
                    retry_count: row.retry_count.max(0) as u32 + 1,
                },
            );
            match self.queue.enqueue(spec).await {
                Ok(_) => redispatched += 1,
                Err(e) => {
                    tracing::error!(
                        comment_id = %comment_id,
                        error = %e,
                        "Failed to re-dispatch stalled classification",
                    );
                }
            }
        }

        tracing::info!(
            stalled = comment_ids.len(),
            redispatched,
            "Retry sweep re-dispatched stalled classifications",
        );
        Ok(())
    }
}
