//! Reply delivery: post the generated answer under the comment.
//!
//! At-most-once discipline: the distributed lock serializes concurrent
//! dispatches, and the `reply_sent` flag makes re-dispatches after a
//! confirmed delivery no-ops. A missed lock release only costs one TTL.

use std::time::Duration;

use sqlx::PgPool;

use modbot_core::outcome::StageOutcome;
use modbot_core::retry::MAX_RETRIES;
use modbot_db::repositories::{AnswerRepo, CommentRepo};
use modbot_queue::lock::LockStore;

use crate::collaborators::CommentGateway;
use crate::PipelineError;

/// Send the reply for one comment.
///
/// `reply_text` overrides the stored answer when present (manual
/// replies); otherwise the answer row must carry generated text.
pub async fn send_reply(
    pool: &PgPool,
    locks: &dyn LockStore,
    gateway: &dyn CommentGateway,
    comment_id: &str,
    reply_text: Option<&str>,
    retry_count: u32,
    lock_ttl: Duration,
) -> Result<StageOutcome, PipelineError> {
    let key = format!("reply_lock:{comment_id}");
    if !locks.acquire(&key, lock_ttl).await? {
        tracing::info!(comment_id = %comment_id, "Reply already in flight elsewhere");
        return Ok(StageOutcome::skipped("already_processing"));
    }

    let result = send_reply_locked(pool, gateway, comment_id, reply_text, retry_count).await;

    // The TTL covers a missed release; do not let a release failure mask
    // the stage result.
    if let Err(err) = locks.release(&key).await {
        tracing::warn!(comment_id = %comment_id, error = %err, "Failed to release reply lock");
    }

    result
}

async fn send_reply_locked(
    pool: &PgPool,
    gateway: &dyn CommentGateway,
    comment_id: &str,
    reply_text: Option<&str>,
    retry_count: u32,
) -> Result<StageOutcome, PipelineError> {
    if CommentRepo::find_by_id(pool, comment_id).await?.is_none() {
        tracing::warn!(comment_id = %comment_id, "Reply dispatched for unknown comment");
        return Ok(StageOutcome::error("comment_not_found"));
    }

    let answer = AnswerRepo::get_or_create(pool, comment_id).await?;

    if answer.reply_sent {
        tracing::info!(comment_id = %comment_id, "Reply already sent");
        return Ok(StageOutcome::skipped("already_sent"));
    }

    let stored = answer.answer.as_deref().filter(|a| !a.is_empty());
    let Some(text) = reply_text.or(stored) else {
        AnswerRepo::mark_reply_failed(pool, answer.id, "no reply text available").await?;
        tracing::error!(comment_id = %comment_id, "No reply text to send");
        return Ok(StageOutcome::error("no_reply_text"));
    };

    match gateway.send_reply(comment_id, text).await {
        Ok(receipt) => {
            AnswerRepo::mark_reply_sent(pool, answer.id, receipt.reply_id.as_deref()).await?;
            tracing::info!(
                comment_id = %comment_id,
                reply_id = receipt.reply_id.as_deref().unwrap_or(""),
                "Reply delivered",
            );
            Ok(StageOutcome::Success { verdict: None })
        }
        Err(err) if err.should_retry() && retry_count < MAX_RETRIES => {
            tracing::warn!(
                comment_id = %comment_id,
                retry_count,
                retry_after = err.retry_after,
                error = %err,
                "Reply delivery hit a transient failure, scheduling retry",
            );
            Ok(StageOutcome::retry_after("reply_rate_limited", err.retry_after))
        }
        Err(err) => {
            let message = err.to_string();
            AnswerRepo::mark_reply_failed(pool, answer.id, &message).await?;
            tracing::error!(
                comment_id = %comment_id,
                retry_count,
                error = %message,
                "Reply delivery failed permanently",
            );
            Ok(StageOutcome::error("reply_failed"))
        }
    }
}
