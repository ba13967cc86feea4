//! Repository for the `tasks` table — the durable work queue.
//!
//! Claiming uses `SELECT ... FOR UPDATE SKIP LOCKED` so multiple worker
//! processes can poll concurrently without double-dispatching a task.

use sqlx::PgPool;

use modbot_core::types::DbId;

use crate::models::status::TaskStatus;
use crate::models::task::{NewTask, Task};

/// Column list for `tasks` queries.
const COLUMNS: &str = "\
    id, task_name, args, trace_id, status_id, run_at, claimed_at, \
    attempts, last_error, created_at, updated_at";

/// Provides queue operations for background tasks.
pub struct TaskRepo;

impl TaskRepo {
    /// Enqueue a task, due immediately or after the countdown.
    pub async fn enqueue(pool: &PgPool, input: &NewTask) -> Result<Task, sqlx::Error> {
        let query = format!(
            "INSERT INTO tasks (task_name, args, trace_id, status_id, run_at) \
             VALUES ($1, $2, $3, $4, NOW() + make_interval(secs => $5)) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Task>(&query)
            .bind(&input.task_name)
            .bind(&input.args)
            .bind(&input.trace_id)
            .bind(TaskStatus::Pending.id())
            .bind(input.countdown_secs.unwrap_or(0) as f64)
            .fetch_one(pool)
            .await
    }

    /// Atomically claim the next due pending task.
    pub async fn claim_next(pool: &PgPool) -> Result<Option<Task>, sqlx::Error> {
        let query = format!(
            "UPDATE tasks \
             SET status_id = $1, claimed_at = NOW(), attempts = attempts + 1, \
                 updated_at = NOW() \
             WHERE id = ( \
                 SELECT id FROM tasks \
                 WHERE status_id = $2 AND run_at <= NOW() \
                 ORDER BY run_at ASC \
                 LIMIT 1 \
                 FOR UPDATE SKIP LOCKED \
             ) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Task>(&query)
            .bind(TaskStatus::Running.id())
            .bind(TaskStatus::Pending.id())
            .fetch_optional(pool)
            .await
    }

    /// Mark a claimed task as completed.
    pub async fn complete(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE tasks SET status_id = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(TaskStatus::Completed.id())
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Mark a claimed task as failed with its error message.
    pub async fn fail(pool: &PgPool, id: DbId, error: &str) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE tasks SET status_id = $2, last_error = $3, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(TaskStatus::Failed.id())
        .bind(error)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Find a task by id (used by tests and debugging endpoints).
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Task>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM tasks WHERE id = $1");
        sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}
