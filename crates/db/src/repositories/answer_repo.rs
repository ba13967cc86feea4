//! Repository for the `answers` table.
//!
//! Same get-or-create discipline as classifications: `comment_id` is
//! unique and conflicts fall back to the existing row.

use sqlx::PgPool;

use modbot_core::types::DbId;

use crate::models::answer::{Answer, AnswerContent};
use crate::models::status::ProcessingStatus;

/// Column list for `answers` queries.
const COLUMNS: &str = "\
    id, comment_id, status_id, answer, confidence, quality_score, \
    input_tokens, output_tokens, processing_time_ms, \
    retry_count, max_retries, last_error, \
    reply_sent, reply_sent_at, reply_status, reply_error, reply_id, \
    processing_started_at, processing_completed_at, created_at, updated_at";

/// Provides persistence operations for answer state and reply tracking.
pub struct AnswerRepo;

impl AnswerRepo {
    /// Find the answer row for a comment.
    pub async fn find_by_comment(
        pool: &PgPool,
        comment_id: &str,
    ) -> Result<Option<Answer>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM answers WHERE comment_id = $1");
        sqlx::query_as::<_, Answer>(&query)
            .bind(comment_id)
            .fetch_optional(pool)
            .await
    }

    /// Fetch the existing row or insert a fresh PENDING one (race-safe).
    pub async fn get_or_create(pool: &PgPool, comment_id: &str) -> Result<Answer, sqlx::Error> {
        let query = format!(
            "INSERT INTO answers (comment_id, status_id) \
             VALUES ($1, $2) \
             ON CONFLICT (comment_id) DO NOTHING \
             RETURNING {COLUMNS}"
        );
        let inserted = sqlx::query_as::<_, Answer>(&query)
            .bind(comment_id)
            .bind(ProcessingStatus::Pending.id())
            .fetch_optional(pool)
            .await?;

        match inserted {
            Some(row) => Ok(row),
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
            "UPDATE answers \
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

    /// Transition to COMPLETED with the generated answer payload.
    pub async fn mark_completed(
        pool: &PgPool,
        id: DbId,
        content: &AnswerContent,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE answers \
             SET status_id = $2, answer = $3, confidence = $4, quality_score = $5, \
                 input_tokens = $6, output_tokens = $7, processing_time_ms = $8, \
                 last_error = NULL, processing_completed_at = NOW(), updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(ProcessingStatus::Completed.id())
        .bind(&content.answer)
        .bind(content.confidence)
        .bind(content.quality_score)
        .bind(content.input_tokens)
        .bind(content.output_tokens)
        .bind(content.processing_time_ms)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Record a generation failure, terminal or not.
    pub async fn mark_failure(
        pool: &PgPool,
        id: DbId,
        retry_count: i32,
        error: &str,
        terminal: bool,
    ) -> Result<(), sqlx::Error> {
        let status = if terminal {
            ProcessingStatus::Failed
        } else {
            ProcessingStatus::Retry
        };
        sqlx::query(
            "UPDATE answers \
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

    /// Record a successfully delivered reply with its external id.
    pub async fn mark_reply_sent(
        pool: &PgPool,
        id: DbId,
        reply_id: Option<&str>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE answers \
             SET reply_sent = TRUE, reply_sent_at = NOW(), reply_status = 'sent', \
                 reply_error = NULL, reply_id = $2, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(reply_id)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Record a hard reply delivery failure.
    pub async fn mark_reply_failed(pool: &PgPool, id: DbId, error: &str) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE answers \
             SET reply_status = 'failed', reply_error = $2, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(error)
        .execute(pool)
        .await?;
        Ok(())
    }
}
