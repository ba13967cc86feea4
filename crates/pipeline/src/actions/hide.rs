//! Hide/unhide: flip a comment's visibility on the platform.
//!
//! The local `is_hidden` flag changes only after the gateway confirms,
//! so the database never claims a visibility the platform does not have.
//! The idempotence gate reads local state: a comment already in the
//! requested state skips the gateway call entirely.

use std::time::Duration;

use sqlx::PgPool;

use modbot_core::outcome::StageOutcome;
use modbot_core::retry::MAX_RETRIES;
use modbot_db::repositories::CommentRepo;
use modbot_queue::lock::LockStore;

use crate::collaborators::CommentGateway;
use crate::PipelineError;

/// Hide (or unhide) one comment.
///
/// `by_bot` records whether the pipeline's routing initiated the hide, as
/// opposed to a manual moderation request.
pub async fn hide_comment(
    pool: &PgPool,
    locks: &dyn LockStore,
    gateway: &dyn CommentGateway,
    comment_id: &str,
    hide: bool,
    by_bot: bool,
    retry_count: u32,
    lock_ttl: Duration,
) -> Result<StageOutcome, PipelineError> {
    let key = format!("hide_lock:{comment_id}");
    if !locks.acquire(&key, lock_ttl).await? {
        tracing::info!(comment_id = %comment_id, "Hide already in flight elsewhere");
        return Ok(StageOutcome::skipped("already_processing"));
    }

    let result = hide_comment_locked(pool, gateway, comment_id, hide, by_bot, retry_count).await;

    if let Err(err) = locks.release(&key).await {
        tracing::warn!(comment_id = %comment_id, error = %err, "Failed to release hide lock");
    }

    result
}

async fn hide_comment_locked(
    pool: &PgPool,
    gateway: &dyn CommentGateway,
    comment_id: &str,
    hide: bool,
    by_bot: bool,
    retry_count: u32,
) -> Result<StageOutcome, PipelineError> {
    let Some(comment) = CommentRepo::find_by_id(pool, comment_id).await? else {
        tracing::warn!(comment_id = %comment_id, "Hide dispatched for unknown comment");
        return Ok(StageOutcome::error("comment_not_found"));
    };

    if comment.is_hidden == hide {
        let reason = if hide { "already_hidden" } else { "already_visible" };
        tracing::info!(comment_id = %comment_id, "Comment already in requested visibility");
        return Ok(StageOutcome::skipped(reason));
    }

    match gateway.set_hidden(comment_id, hide).await {
        Ok(()) => {
            CommentRepo::set_hidden(pool, comment_id, hide, by_bot).await?;
            tracing::info!(comment_id = %comment_id, hidden = hide, by_bot, "Comment visibility updated");
            Ok(StageOutcome::Success { verdict: None })
        }
        Err(err) if err.should_retry() && retry_count < MAX_RETRIES => {
            tracing::warn!(
                comment_id = %comment_id,
                retry_count,
                retry_after = err.retry_after,
                error = %err,
                "Hide hit a transient failure, scheduling retry",
            );
            Ok(StageOutcome::retry_after("hide_transient_failure", err.retry_after))
        }
        Err(err) => {
            tracing::error!(
                comment_id = %comment_id,
                retry_count,
                error = %err,
                "Hide failed permanently",
            );
            Ok(StageOutcome::error("hide_failed"))
        }
    }
}
