//! Task execution: map a claimed queue row to the pipeline stage it names,
//! run the stage, then settle the row from the stage's outcome.
//!
//! Settlement rules:
//! - `Success` / `Skipped` complete the row; success additionally enqueues
//!   any follow-up work the stage routes to.
//! - `Error` fails the row with the stage's reason.
//! - `Retry` re-enqueues the same task with the attempt counter bumped and
//!   a backoff countdown, then completes the current row. A retry past the
//!   budget fails instead.

use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;

use modbot_core::outcome::StageOutcome;
use modbot_core::retry::{retry_countdown, MAX_RETRIES};
use modbot_db::models::task::Task;
use modbot_db::repositories::TaskRepo;
use modbot_pipeline::actions::{alert, hide, reply};
use modbot_pipeline::collaborators::{
    AlertNotifier, AnswerGenerator, Classifier, CommentGateway, MediaResolver,
};
use modbot_pipeline::routing::dispatch_routed_actions;
use modbot_pipeline::{answer, classification, PipelineError};
use modbot_queue::lock::LockStore;
use modbot_queue::tasks::{AlertArgs, HideArgs, ReplyArgs, StageArgs, TaskSpec};
use modbot_queue::{TaskName, TaskQueue};

/// Why a claimed task could not be settled normally.
#[derive(Debug, thiserror::Error)]
pub enum ExecuteError {
    #[error("unknown task name: {0}")]
    UnknownTask(String),

    #[error("invalid task args: {0}")]
    InvalidArgs(#[from] serde_json::Error),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

/// Executes claimed tasks against the pipeline stages.
pub struct StageRunner {
    pool: PgPool,
    queue: TaskQueue,
    locks: Arc<dyn LockStore>,
    classifier: Arc<dyn Classifier>,
    resolver: Arc<dyn MediaResolver>,
    generator: Arc<dyn AnswerGenerator>,
    gateway: Arc<dyn CommentGateway>,
    notifier: Arc<dyn AlertNotifier>,
    lock_ttl: Duration,
}

impl StageRunner {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        pool: PgPool,
        queue: TaskQueue,
        locks: Arc<dyn LockStore>,
        classifier: Arc<dyn Classifier>,
        resolver: Arc<dyn MediaResolver>,
        generator: Arc<dyn AnswerGenerator>,
        gateway: Arc<dyn CommentGateway>,
        notifier: Arc<dyn AlertNotifier>,
        lock_ttl: Duration,
    ) -> Self {
        Self {
            pool,
            queue,
            locks,
            classifier,
            resolver,
            generator,
            gateway,
            notifier,
            lock_ttl,
        }
    }

    /// Run one claimed task to settlement. Never panics the caller; an
    /// execution error fails the task row.
    pub async fn execute(&self, task: Task) {
        let task_id = task.id;
        let task_name = task.task_name.clone();
        if let Err(err) = self.run(&task).await {
            tracing::error!(
                task_id,
                task_name = %task_name,
                trace_id = task.trace_id.as_deref().unwrap_or(""),
                error = %err,
                "Task execution failed",
            );
            if let Err(db_err) = TaskRepo::fail(&self.pool, task_id, &err.to_string()).await {
                tracing::error!(task_id, error = %db_err, "Failed to mark task as failed");
            }
        }
    }

    async fn run(&self, task: &Task) -> Result<(), ExecuteError> {
        let name = TaskName::parse(&task.task_name)
            .ok_or_else(|| ExecuteError::UnknownTask(task.task_name.clone()))?;

        let (outcome, retry_count) = match name {
            TaskName::ClassifyComment => {
                let args: StageArgs = serde_json::from_value(task.args.clone())?;
                let outcome = classification::classify_comment(
                    &self.pool,
                    self.classifier.as_ref(),
                    self.resolver.as_ref(),
                    &args.comment_id,
                    args.retry_count,
                )
                .await?;
                if let StageOutcome::Success {
                    verdict: Some(verdict),
                } = &outcome
                {
                    dispatch_routed_actions(
                        &self.queue,
                        &args.comment_id,
                        verdict,
                        task.trace_id.as_deref(),
                    )
                    .await;
                }
                (outcome, args.retry_count)
            }
            TaskName::GenerateAnswer => {
                let args: StageArgs = serde_json::from_value(task.args.clone())?;
                let outcome = answer::generate_answer(
                    &self.pool,
                    self.generator.as_ref(),
                    &args.comment_id,
                    args.retry_count,
                )
                .await?;
                if matches!(outcome, StageOutcome::Success { .. }) {
                    self.enqueue_reply(&args.comment_id, task.trace_id.as_deref())
                        .await;
                }
                (outcome, args.retry_count)
            }
            TaskName::SendReply => {
                let args: ReplyArgs = serde_json::from_value(task.args.clone())?;
                let outcome = reply::send_reply(
                    &self.pool,
                    self.locks.as_ref(),
                    self.gateway.as_ref(),
                    &args.comment_id,
                    args.reply_text.as_deref(),
                    args.retry_count,
                    self.lock_ttl,
                )
                .await?;
                (outcome, args.retry_count)
            }
            TaskName::HideComment => {
                let args: HideArgs = serde_json::from_value(task.args.clone())?;
                let outcome = hide::hide_comment(
                    &self.pool,
                    self.locks.as_ref(),
                    self.gateway.as_ref(),
                    &args.comment_id,
                    args.hide,
                    args.initiator == "bot",
                    args.retry_count,
                    self.lock_ttl,
                )
                .await?;
                (outcome, args.retry_count)
            }
            TaskName::SendAlert => {
                let args: AlertArgs = serde_json::from_value(task.args.clone())?;
                let outcome = alert::send_alert(
                    &self.pool,
                    self.notifier.as_ref(),
                    &args.comment_id,
                    args.retry_count,
                )
                .await?;
                (outcome, args.retry_count)
            }
        };

        self.settle(task, name, outcome, retry_count).await
    }

    async fn settle(
        &self,
        task: &Task,
        name: TaskName,
        outcome: StageOutcome,
        retry_count: u32,
    ) -> Result<(), ExecuteError> {
        match outcome {
            StageOutcome::Success { .. } => {
                TaskRepo::complete(&self.pool, task.id).await?;
                tracing::info!(
                    task_id = task.id,
                    task_name = name.as_str(),
                    trace_id = task.trace_id.as_deref().unwrap_or(""),
                    "Task completed",
                );
            }
            StageOutcome::Skipped { reason } => {
                TaskRepo::complete(&self.pool, task.id).await?;
                tracing::info!(
                    task_id = task.id,
                    task_name = name.as_str(),
                    reason = %reason,
                    "Task skipped",
                );
            }
            StageOutcome::Error { reason } => {
                TaskRepo::fail(&self.pool, task.id, &reason).await?;
                tracing::warn!(
                    task_id = task.id,
                    task_name = name.as_str(),
                    reason = %reason,
                    "Task failed terminally",
                );
            }
            StageOutcome::Retry {
                reason,
                retry_after,
            } => {
                let next = retry_count + 1;
                if next > MAX_RETRIES {
                    TaskRepo::fail(
                        &self.pool,
                        task.id,
                        &format!("retry budget exhausted: {reason}"),
                    )
                    .await?;
                    tracing::warn!(
                        task_id = task.id,
                        task_name = name.as_str(),
                        reason = %reason,
                        "Retry budget exhausted",
                    );
                    return Ok(());
                }

                let countdown = retry_countdown(retry_count, retry_after);
                let mut args = task.args.clone();
                if let Some(envelope) = args.as_object_mut() {
                    envelope.insert("retry_count".into(), next.into());
                }
                let spec = TaskSpec {
                    name,
                    args,
                    countdown: Some(countdown),
                    trace_id: task.trace_id.clone(),
                };
                self.queue.enqueue(spec).await?;
                TaskRepo::complete(&self.pool, task.id).await?;
                tracing::info!(
                    task_id = task.id,
                    task_name = name.as_str(),
                    reason = %reason,
                    retry_count = next,
                    countdown_secs = countdown.as_secs(),
                    "Task re-enqueued for retry",
                );
            }
        }
        Ok(())
    }

    /// Queue the reply once an answer has been generated. The reply stage
    /// short-circuits if it was already sent, so a duplicate enqueue here
    /// is harmless.
    async fn enqueue_reply(&self, comment_id: &str, trace_id: Option<&str>) {
        let mut spec = TaskSpec::new(
            TaskName::SendReply,
            ReplyArgs {
                comment_id: comment_id.to_string(),
                reply_text: None,
                retry_count: 0,
            },
        );
        if let Some(trace_id) = trace_id {
            spec = spec.with_trace_id(trace_id);
        }
        if let Err(err) = self.queue.enqueue(spec).await {
            tracing::error!(
                comment_id = %comment_id,
                error = %err,
                "Failed to enqueue reply task",
            );
        }
    }
}
