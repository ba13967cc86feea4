//! Classification stage: decide what kind of comment this is.
//!
//! The stage is a state machine over the classification row. Gates run
//! before any bookkeeping mutates: a comment waiting for media context
//! retries without consuming its retry budget, and a row that already
//! completed short-circuits so duplicate dispatches are no-ops.

use sqlx::PgPool;

use modbot_core::conversation::conversation_id;
use modbot_core::outcome::StageOutcome;
use modbot_core::verdict::Verdict;
use modbot_db::models::classification::ClassificationVerdict;
use modbot_db::models::status::ProcessingStatus;
use modbot_db::repositories::{ClassificationRepo, CommentRepo, MediaRepo};

use crate::collaborators::{Classifier, ClassifyRequest, MediaResolver, MediaSnapshot};
use crate::PipelineError;

/// Classify one comment.
///
/// `retry_count` is the current attempt number, zero on first dispatch.
/// Capability failures become `Retry` until the budget is spent, then
/// `Error`; only persistence failures propagate.
pub async fn classify_comment(
    pool: &PgPool,
    classifier: &dyn Classifier,
    resolver: &dyn MediaResolver,
    comment_id: &str,
    retry_count: u32,
) -> Result<StageOutcome, PipelineError> {
    let Some(comment) = CommentRepo::find_by_id(pool, comment_id).await? else {
        tracing::warn!(comment_id = %comment_id, "Classification dispatched for unknown comment");
        return Ok(StageOutcome::error("comment_not_found"));
    };

    // Admission normally caches the media row; resolve it on the spot if
    // this dispatch got here first.
    let media = match MediaRepo::find_by_id(pool, &comment.media_id).await? {
        Some(media) => media,
        None => match resolver.resolve(&comment.media_id).await {
            Ok(fetched) => MediaRepo::upsert(pool, &comment.media_id, &fetched).await?,
            Err(err) => {
                tracing::warn!(
                    comment_id = %comment_id,
                    media_id = %comment.media_id,
                    error = %err,
                    "Media unavailable at classification time",
                );
                return Ok(StageOutcome::error("media_unavailable"));
            }
        },
    };

    if !media.is_processing_enabled {
        return Ok(StageOutcome::skipped("media_processing_disabled"));
    }

    // Image comments wait for the media-analysis service. This retry does
    // not touch the row's retry bookkeeping; the comment is not failing,
    // it is early.
    if media.requires_visual_context() && !media.visual_context_ready() {
        tracing::info!(
            comment_id = %comment_id,
            media_id = %media.id,
            "Waiting for media context before classification",
        );
        return Ok(StageOutcome::retry("waiting_for_media_context"));
    }

    let classification = ClassificationRepo::get_or_create(pool, comment_id).await?;

    // A completed row means another dispatch already did the work.
    if classification.status_id == ProcessingStatus::Completed.id() {
        let verdict = classification.verdict.as_deref().map(Verdict::from_label);
        tracing::info!(comment_id = %comment_id, "Classification already completed");
        return Ok(StageOutcome::Success { verdict });
    }

    ClassificationRepo::mark_processing(pool, classification.id, retry_count as i32).await?;

    let conversation = conversation_id(&comment.id, comment.parent_id.as_deref());
    CommentRepo::set_conversation_id(pool, &comment.id, &conversation).await?;

    let request = ClassifyRequest {
        comment_id: comment.id.clone(),
        comment_text: comment.text.clone(),
        comment_username: comment.username.clone(),
        conversation_id: conversation,
        media: MediaSnapshot::from_media(&media),
    };

    match classifier.classify(&request).await {
        Ok(output) => {
            let verdict = Verdict::from_label(&output.label);
            let result = ClassificationVerdict {
                verdict: verdict.label().to_string(),
                confidence: output.confidence,
                reasoning: output.reasoning,
                input_tokens: output.input_tokens,
                output_tokens: output.output_tokens,
            };
            ClassificationRepo::mark_completed(pool, classification.id, &result).await?;
            tracing::info!(
                comment_id = %comment_id,
                verdict = verdict.label(),
                confidence = output.confidence,
                "Comment classified",
            );
            Ok(StageOutcome::Success {
                verdict: Some(verdict),
            })
        }
        Err(err) => {
            let message = err.to_string();
            if (retry_count as i32) < classification.max_retries {
                // The row keeps the attempt number that just failed; the
                // next attempt's mark_processing stamps the bumped value.
                ClassificationRepo::mark_retry(
                    pool,
                    classification.id,
                    retry_count as i32,
                    &message,
                )
                .await?;
                tracing::warn!(
                    comment_id = %comment_id,
                    retry_count,
                    error = %message,
                    "Classification failed, scheduling retry",
                );
                Ok(StageOutcome::retry("classification_failed"))
            } else {
                ClassificationRepo::mark_failed(
                    pool,
                    classification.id,
                    retry_count as i32,
                    &message,
                )
                .await?;
                tracing::error!(
                    comment_id = %comment_id,
                    retry_count,
                    error = %message,
                    "Classification failed permanently",
                );
                Ok(StageOutcome::error("classification_failed"))
            }
        }
    }
}
