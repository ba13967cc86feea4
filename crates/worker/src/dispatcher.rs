//! Background task dispatcher.
//!
//! Polls the durable queue every `poll_interval` and hands claimed tasks
//! to the [`StageRunner`]. Claiming uses `SELECT FOR UPDATE SKIP LOCKED`
//! via [`TaskRepo::claim_next`] so several worker processes can poll the
//! same table without double-dispatching.

use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use modbot_db::repositories::TaskRepo;

use crate::executor::StageRunner;

/// Background task dispatcher.
///
/// A single long-lived Tokio task that claims due work and runs each
/// claimed task on its own spawned task, bounded by a semaphore.
pub struct TaskDispatcher {
    pool: PgPool,
    runner: Arc<StageRunner>,
    poll_interval: Duration,
    permits: Arc<Semaphore>,
}

impl TaskDispatcher {
    pub fn new(
        pool: PgPool,
        runner: Arc<StageRunner>,
        poll_interval: Duration,
        concurrency: usize,
    ) -> Self {
        Self {
            pool,
            runner,
            poll_interval,
            permits: Arc::new(Semaphore::new(concurrency.max(1))),
        }
    }

    /// Run the dispatch loop until the cancellation token is triggered.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.poll_interval);
        tracing::info!(
            poll_interval_ms = self.poll_interval.as_millis() as u64,
            concurrency = self.permits.available_permits(),
            "Task dispatcher started",
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Task dispatcher shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    self.drain_due_tasks().await;
                }
            }
        }
    }

    /// One dispatch cycle: claim tasks while both permits and due work
    /// remain, spawning each claimed task onto the runtime.
    async fn drain_due_tasks(&self) {
        loop {
            let Ok(permit) = Arc::clone(&self.permits).try_acquire_owned() else {
                // All execution slots busy; the next tick retries.
                break;
            };

            match TaskRepo::claim_next(&self.pool).await {
                Ok(Some(task)) => {
                    tracing::info!(
                        task_id = task.id,
                        task_name = %task.task_name,
                        trace_id = task.trace_id.as_deref().unwrap_or(""),
                        attempts = task.attempts,
                        "Task claimed",
                    );
                    let runner = Arc::clone(&self.runner);
                    tokio::spawn(async move {
                        runner.execute(task).await;
                        drop(permit);
                    });
                }
                Ok(None) => break,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to claim next task");
                    break;
                }
            }
        }
    }
}
