//! Operator alerts for comments that need human attention.
//!
//! Alerts carry no per-row retry bookkeeping; transport failures retry
//! on the shared schedule and give up quietly after the budget.

use sqlx::PgPool;

use modbot_core::outcome::StageOutcome;
use modbot_core::retry::MAX_RETRIES;
use modbot_db::repositories::{ClassificationRepo, CommentRepo, MediaRepo};

use crate::collaborators::{AlertNotifier, ModerationAlert};
use crate::PipelineError;

/// Notify the operator about one comment.
pub async fn send_alert(
    pool: &PgPool,
    notifier: &dyn AlertNotifier,
    comment_id: &str,
    retry_count: u32,
) -> Result<StageOutcome, PipelineError> {
    let Some(comment) = CommentRepo::find_by_id(pool, comment_id).await? else {
        tracing::warn!(comment_id = %comment_id, "Alert dispatched for unknown comment");
        return Ok(StageOutcome::error("comment_not_found"));
    };

    let classification = ClassificationRepo::find_by_comment(pool, comment_id).await?;
    let media = MediaRepo::find_by_id(pool, &comment.media_id).await?;

    let alert = ModerationAlert {
        comment_id: comment.id.clone(),
        username: comment.username.clone(),
        text: comment.text.clone(),
        verdict_label: classification
            .and_then(|c| c.verdict)
            .unwrap_or_else(|| "unclassified".into()),
        permalink: media.and_then(|m| m.permalink),
    };

    match notifier.notify(&alert).await {
        Ok(()) => {
            tracing::info!(comment_id = %comment_id, verdict = %alert.verdict_label, "Alert sent");
            Ok(StageOutcome::Success { verdict: None })
        }
        Err(err) if retry_count < MAX_RETRIES => {
            tracing::warn!(
                comment_id = %comment_id,
                retry_count,
                error = %err,
                "Alert delivery failed, scheduling retry",
            );
            Ok(StageOutcome::retry("alert_failed"))
        }
        Err(err) => {
            tracing::error!(
                comment_id = %comment_id,
                retry_count,
                error = %err,
                "Alert delivery failed permanently",
            );
            Ok(StageOutcome::error("alert_failed"))
        }
    }
}
