//! Repository for the `classifications` table.
//!
//! The unique constraint on `comment_id` makes `get_or_create` race-safe:
//! two near-simultaneous callers cannot both insert, the loser falls back
//! to selecting the winner's row.

use sqlx::PgPool;

use modbot_core::types::DbId;

use crate::models::classification::{Classification, ClassificationVerdict};
use crate::models::status::ProcessingStatus;

/// Column list for `classifications` queries.
const COLUMNS: &str = "\
    id, comment_id, status_id, verdict, confidence, reasoning, \
    input_tokens, output_tokens, retry_count, max_retries, last_error, \
    processing_started_at, processing_completed_at, created_at, updated_at";

/// Provides persistence operations for classification state.
pub struct ClassificationRepo;

impl ClassificationRepo {
    /// Find the classification row for a comment.
    pub async fn find_by_comment(
        pool: &PgPool,
        comment_id: &str,
    ) -> Result<Option<Classification>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM classifications WHERE comment_id = $1");
        sqlx::query_as::<_, Classification>(&query)
            .bind(comment_id)
            .fetch_optional(pool)
            .await
    }

    /// Fetch the existing row or insert a fresh PENDING one.
    ///
    /// `ON CONFLICT DO NOTHING` plus the follow-up select makes this safe
    /// against a concurrent creator.
    pub async fn get_or_create(
        pool: &PgPool,
        comment_id: &str,
    ) -> Result<Classification, sqlx::Error> {
        let query = format!(
            "INSERT INTO classifications (comment_id, status_id) \
             VALUES ($1, $2) \
             ON CONFLICT (comment_id) DO NOTHING \
             RETURNING {COLUMNS}"
        );
        let inserted = sqlx::query_as::<_, Classification>(&query)
            .bind(comment_id)
            .bind(ProcessingStatus::Pending.id())
            .fetch_optional(pool)
            .await?;

        match inserted {
            Some(row) => Ok(row),
            // Lost the insert race; the other writer's row must exist.
            None => Self::find_by_comment(pool, comment_id)
                .await?
                .ok_or(sqlx::Error::RowNotFound),
        }
    }

    /// Transition to PROCESSING, stamping the retry count and start time.
    pub async fn mark_processing(
        pool: &PgPool,
        id: DbId,
        retry_count: i32,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE classifications \
             SET status_id = $2, retry_count = $3, \
                 processing_started_at = NOW(), updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(ProcessingStatus::Processing.id())
        .bind(retry_count)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Transition to COMPLETED with the verdict payload; clears `last_error`.
    pub async fn mark_completed(
        pool: &PgPool,
        id: DbId,
        result: &ClassificationVerdict,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE classifications \
             SET status_id = $2, verdict = $3, confidence = $4, reasoning = $5, \
                 input_tokens = $6, output_tokens = $7, last_error = NULL, \
                 processing_completed_at = NOW(), updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(ProcessingStatus::Completed.id())
        .bind(&result.verdict)
        .bind(result.confidence)
        .bind(result.reasoning.as_deref())
        .bind(result.input_tokens)
        .bind(result.output_tokens)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Transition to RETRY, recording the failure for the next attempt.
    pub async fn mark_retry(
        pool: &PgPool,
        id: DbId,
        retry_count: i32,
        error: &str,
    ) -> Result<(), sqlx::Error> {
        Self::mark_failure(pool, id, ProcessingStatus::Retry, retry_count, error).await
    }

    /// Transition to FAILED once retries are exhausted.
    pub async fn mark_failed(
        pool: &PgPool,
        id: DbId,
        retry_count: i32,
        error: &str,
    ) -> Result<(), sqlx::Error> {
        Self::mark_failure(pool, id, ProcessingStatus::Failed, retry_count, error).await
    }

    async fn mark_failure(
        pool: &PgPool,
        id: DbId,
        status: ProcessingStatus,
        retry_count: i32,
        error: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE classifications \
             SET status_id = $2, retry_count = $3, last_error = $4, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(status.id())
        .bind(retry_count)
        .bind(error)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Comment ids of rows parked in RETRY and untouched for at least
    /// `stale_secs`. The age filter keeps the periodic sweeper from
    /// double-dispatching rows whose retry task is still queued.
    pub async fn pending_retry_comment_ids(
        pool: &PgPool,
        stale_secs: i64,
    ) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>(
            "SELECT comment_id FROM classifications \
             WHERE status_id = $1 AND retry_count < max_retries \
               AND updated_at < NOW() - make_interval(secs => $2) \
             ORDER BY updated_at ASC",
        )
        .bind(ProcessingStatus::Retry.id())
        .bind(stale_secs as f64)
        .fetch_all(pool)
        .await
    }
}
