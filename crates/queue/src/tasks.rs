//! Durable task queue over the `tasks` table.
//!
//! Every queued unit of work is a [`TaskName`] plus a JSON argument
//! envelope. An opaque trace id rides along with each task so log lines
//! from admission, classification, and the follow-up actions of one
//! comment can be correlated across worker processes.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use modbot_core::types::DbId;
use modbot_db::models::task::NewTask;
use modbot_db::repositories::TaskRepo;

// ---------------------------------------------------------------------------
// Task names
// ---------------------------------------------------------------------------

/// The closed set of task kinds the worker knows how to execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskName {
    ClassifyComment,
    GenerateAnswer,
    SendReply,
    HideComment,
    SendAlert,
}

impl TaskName {
    /// Stable string form persisted in the `tasks` table.
    pub fn as_str(self) -> &'static str {
        match self {
            TaskName::ClassifyComment => "classify_comment",
            TaskName::GenerateAnswer => "generate_answer",
            TaskName::SendReply => "send_reply",
            TaskName::HideComment => "hide_comment",
            TaskName::SendAlert => "send_alert",
        }
    }

    /// Parse a persisted task name; unknown names are rejected so a
    /// mis-deployed worker fails the task instead of ignoring it.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "classify_comment" => Some(TaskName::ClassifyComment),
            "generate_answer" => Some(TaskName::GenerateAnswer),
            "send_reply" => Some(TaskName::SendReply),
            "hide_comment" => Some(TaskName::HideComment),
            "send_alert" => Some(TaskName::SendAlert),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Argument envelopes
// ---------------------------------------------------------------------------

/// Arguments for `classify_comment` and `generate_answer`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageArgs {
    pub comment_id: String,
    #[serde(default)]
    pub retry_count: u32,
}

/// Arguments for `send_reply`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplyArgs {
    pub comment_id: String,
    /// Explicit reply text override; `None` means use the stored answer.
    #[serde(default)]
    pub reply_text: Option<String>,
    #[serde(default)]
    pub retry_count: u32,
}

/// Arguments for `hide_comment`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HideArgs {
    pub comment_id: String,
    #[serde(default = "default_hide")]
    pub hide: bool,
    /// Who asked for the hide: `"bot"` (pipeline routing) or `"manual"`.
    #[serde(default = "default_initiator")]
    pub initiator: String,
    #[serde(default)]
    pub retry_count: u32,
}

fn default_hide() -> bool {
    true
}

fn default_initiator() -> String {
    "bot".into()
}

/// Arguments for `send_alert`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertArgs {
    pub comment_id: String,
    #[serde(default)]
    pub retry_count: u32,
}

// ---------------------------------------------------------------------------
// TaskSpec
// ---------------------------------------------------------------------------

/// One unit of work to enqueue.
#[derive(Debug, Clone)]
pub struct TaskSpec {
    pub name: TaskName,
    pub args: serde_json::Value,
    pub countdown: Option<Duration>,
    pub trace_id: Option<String>,
}

impl TaskSpec {
    pub fn new(name: TaskName, args: impl Serialize) -> Self {
        Self {
            name,
            // Argument envelopes are plain serde structs; serialization
            // cannot fail for them.
            args: serde_json::to_value(args).unwrap_or(serde_json::Value::Null),
            countdown: None,
            trace_id: None,
        }
    }

    /// Delay execution by the given duration.
    pub fn with_countdown(mut self, countdown: Duration) -> Self {
        self.countdown = Some(countdown);
        self
    }

    /// Propagate an existing trace id instead of minting a new one.
    pub fn with_trace_id(mut self, trace_id: impl Into<String>) -> Self {
        self.trace_id = Some(trace_id.into());
        self
    }
}

// ---------------------------------------------------------------------------
// TaskQueue
// ---------------------------------------------------------------------------

/// Enqueue-side handle to the durable task queue.
#[derive(Clone)]
pub struct TaskQueue {
    pool: PgPool,
}

impl TaskQueue {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Enqueue a task. Returns the queued task's id.
    ///
    /// A task with no trace id gets a fresh one so every unit of work is
    /// correlatable.
    pub async fn enqueue(&self, spec: TaskSpec) -> Result<DbId, sqlx::Error> {
        let trace_id = spec
            .trace_id
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        let task = TaskRepo::enqueue(
            &self.pool,
            &NewTask {
                task_name: spec.name.as_str().to_string(),
                args: spec.args,
                trace_id: Some(trace_id.clone()),
                countdown_secs: spec.countdown.map(|d| d.as_secs() as i64),
            },
        )
        .await?;

        tracing::info!(
            task_id = task.id,
            task_name = spec.name.as_str(),
            trace_id = %trace_id,
            countdown_secs = spec.countdown.map(|d| d.as_secs()).unwrap_or(0),
            "Task enqueued",
        );
        Ok(task.id)
    }

    /// Enqueue several tasks, returning their ids in order.
    pub async fn enqueue_batch(&self, specs: Vec<TaskSpec>) -> Result<Vec<DbId>, sqlx::Error> {
        let mut ids = Vec::with_capacity(specs.len());
        for spec in specs {
            ids.push(self.enqueue(spec).await?);
        }
        tracing::info!(count = ids.len(), "Task batch enqueued");
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_name_round_trips() {
        for name in [
            TaskName::ClassifyComment,
            TaskName::GenerateAnswer,
            TaskName::SendReply,
            TaskName::HideComment,
            TaskName::SendAlert,
        ] {
            assert_eq!(TaskName::parse(name.as_str()), Some(name));
        }
    }

    #[test]
    fn unknown_task_name_is_rejected() {
        assert_eq!(TaskName::parse("reticulate_splines"), None);
    }

    #[test]
    fn hide_args_defaults() {
        let args: HideArgs = serde_json::from_value(serde_json::json!({
            "comment_id": "c1"
        }))
        .unwrap();
        assert!(args.hide);
        assert_eq!(args.initiator, "bot");
        assert_eq!(args.retry_count, 0);
    }

    #[test]
    fn spec_builder_sets_countdown_and_trace() {
        let spec = TaskSpec::new(
            TaskName::ClassifyComment,
            StageArgs {
                comment_id: "c1".into(),
                retry_count: 2,
            },
        )
        .with_countdown(Duration::from_secs(60))
        .with_trace_id("trace-1");

        assert_eq!(spec.countdown, Some(Duration::from_secs(60)));
        assert_eq!(spec.trace_id.as_deref(), Some("trace-1"));
        assert_eq!(spec.args["comment_id"], "c1");
        assert_eq!(spec.args["retry_count"], 2);
    }
}
