//! Queued-task entity models and DTOs.

use modbot_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

use super::status::StatusId;

/// A row from the `tasks` table — one unit of queued pipeline work.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Task {
    pub id: DbId,
    pub task_name: String,
    pub args: serde_json::Value,
    /// Opaque correlation id propagated from the enqueueing stage.
    pub trace_id: Option<String>,
    pub status_id: StatusId,
    /// Earliest time the task may be claimed (enqueue time + countdown).
    pub run_at: Timestamp,
    pub claimed_at: Option<Timestamp>,
    pub attempts: i32,
    pub last_error: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for enqueueing a task.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub task_name: String,
    pub args: serde_json::Value,
    pub trace_id: Option<String>,
    /// Delay before the task becomes claimable, in seconds.
    pub countdown_secs: Option<i64>,
}
