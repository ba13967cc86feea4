//! Answer generation stage: draft a reply for a question comment.
//!
//! Idempotent on the stored answer text: once the row carries an answer,
//! duplicate dispatches short-circuit without calling the generator.

use sqlx::PgPool;

use modbot_core::conversation::conversation_id;
use modbot_core::outcome::StageOutcome;
use modbot_db::models::answer::AnswerContent;
use modbot_db::repositories::{AnswerRepo, ClassificationRepo, CommentRepo, MediaRepo};

use crate::collaborators::{AnswerGenerator, AnswerRequest, MediaSnapshot};
use crate::PipelineError;

/// Generate an answer for one comment.
pub async fn generate_answer(
    pool: &PgPool,
    generator: &dyn AnswerGenerator,
    comment_id: &str,
    retry_count: u32,
) -> Result<StageOutcome, PipelineError> {
    let Some(comment) = CommentRepo::find_by_id(pool, comment_id).await? else {
        tracing::warn!(comment_id = %comment_id, "Answer generation dispatched for unknown comment");
        return Ok(StageOutcome::error("comment_not_found"));
    };

    let answer = AnswerRepo::get_or_create(pool, comment_id).await?;

    if answer.answer.as_deref().is_some_and(|a| !a.is_empty()) {
        tracing::info!(comment_id = %comment_id, "Answer already generated");
        return Ok(StageOutcome::Success { verdict: None });
    }

    AnswerRepo::mark_processing(pool, answer.id, retry_count as i32).await?;

    let media = MediaRepo::find_by_id(pool, &comment.media_id).await?;
    let classification = ClassificationRepo::find_by_comment(pool, comment_id).await?;

    let conversation = comment
        .conversation_id
        .clone()
        .unwrap_or_else(|| conversation_id(&comment.id, comment.parent_id.as_deref()));

    let request = AnswerRequest {
        comment_id: comment.id.clone(),
        comment_text: comment.text.clone(),
        comment_username: comment.username.clone(),
        conversation_id: conversation,
        media: media
            .as_ref()
            .map(MediaSnapshot::from_media)
            .unwrap_or_default(),
        classification_reasoning: classification.and_then(|c| c.reasoning),
    };

    match generator.generate(&request).await {
        Ok(generated) => {
            let content = AnswerContent {
                answer: generated.answer,
                confidence: generated.confidence,
                quality_score: generated.quality_score,
                input_tokens: generated.input_tokens,
                output_tokens: generated.output_tokens,
                processing_time_ms: generated.processing_time_ms,
            };
            AnswerRepo::mark_completed(pool, answer.id, &content).await?;
            tracing::info!(
                comment_id = %comment_id,
                quality_score = content.quality_score,
                "Answer generated",
            );
            Ok(StageOutcome::Success { verdict: None })
        }
        Err(err) => {
            let message = err.to_string();
            let terminal = (retry_count as i32) >= answer.max_retries;
            // Retry or terminal, the row records the attempt that failed.
            AnswerRepo::mark_failure(pool, answer.id, retry_count as i32, &message, terminal)
                .await?;
            if terminal {
                tracing::error!(
                    comment_id = %comment_id,
                    retry_count,
                    error = %message,
                    "Answer generation failed permanently",
                );
                Ok(StageOutcome::error("answer_generation_failed"))
            } else {
                tracing::warn!(
                    comment_id = %comment_id,
                    retry_count,
                    error = %message,
                    "Answer generation failed, scheduling retry",
                );
                Ok(StageOutcome::retry("answer_generation_failed"))
            }
        }
    }
}
