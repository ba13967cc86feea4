//! Webhook admission: validate, persist, and acknowledge an incoming
//! comment.
//!
//! Admission runs synchronously inside the webhook request, so it never
//! surfaces an `Err`: every failure is folded into the typed
//! [`AdmissionOutcome`] ack. The comment insert is the ordering arbiter
//! for duplicate deliveries; a primary-key conflict is a benign race, not
//! an error.

use sqlx::PgPool;

use modbot_core::outcome::AdmissionOutcome;
use modbot_db::is_unique_violation;
use modbot_db::models::comment::CreateComment;
use modbot_db::models::status::ProcessingStatus;
use modbot_db::repositories::{ClassificationRepo, CommentRepo, MediaRepo};

use crate::collaborators::MediaResolver;
use crate::config::PipelineConfig;

/// One webhook comment event, already parsed out of the platform payload.
#[derive(Debug, Clone)]
pub struct AdmissionRequest {
    /// Account the webhook entry claims to belong to.
    pub account_id: String,
    pub comment: CreateComment,
}

/// Admit a webhook comment.
///
/// Order matters: the account gate runs before any I/O, the duplicate
/// check before media resolution, and the insert last so the unique
/// violation cleanly signals a lost creation race.
pub async fn admit(
    pool: &PgPool,
    resolver: &dyn MediaResolver,
    config: &PipelineConfig,
    request: AdmissionRequest,
) -> AdmissionOutcome {
    let comment = &request.comment;

    if request.account_id != config.account_id {
        tracing::warn!(
            account_id = %request.account_id,
            comment_id = %comment.id,
            "Webhook event for a foreign account rejected",
        );
        return AdmissionOutcome::Forbidden {
            reason: "invalid_webhook_account".into(),
        };
    }

    // Our own replies arrive back through the webhook; they are stored
    // for thread context but never classified.
    let own_comment = config.is_own_user(&comment.user_id);

    match CommentRepo::find_with_classification(pool, &comment.id).await {
        Ok(Some((_, classification))) => {
            let status_id = classification.map(|c| c.status_id);
            let should_classify =
                !own_comment && ProcessingStatus::needs_classification(status_id);
            tracing::info!(
                comment_id = %comment.id,
                should_classify,
                "Duplicate webhook delivery for known comment",
            );
            return AdmissionOutcome::Exists { should_classify };
        }
        Ok(None) => {}
        Err(err) => {
            tracing::error!(comment_id = %comment.id, error = %err, "Comment lookup failed");
            return AdmissionOutcome::Error {
                reason: "failed_to_store_comment".into(),
            };
        }
    }

    if let Err(outcome) = ensure_media(pool, resolver, &comment.media_id).await {
        return outcome;
    }

    match CommentRepo::insert(pool, comment).await {
        Ok(_) => {}
        // Lost the creation race to a concurrent delivery; the winner's
        // pipeline owns classification.
        Err(err) if is_unique_violation(&err) => {
            tracing::info!(comment_id = %comment.id, "Comment insert lost a creation race");
            return AdmissionOutcome::Exists {
                should_classify: false,
            };
        }
        Err(err) => {
            tracing::error!(comment_id = %comment.id, error = %err, "Comment insert failed");
            return AdmissionOutcome::Error {
                reason: "failed_to_store_comment".into(),
            };
        }
    }

    // Seed the one-to-one classification row at birth. The classification
    // stage get-or-creates defensively, so a failure here is not fatal.
    if let Err(err) = ClassificationRepo::get_or_create(pool, &comment.id).await {
        tracing::warn!(
            comment_id = %comment.id,
            error = %err,
            "Could not seed classification row at admission",
        );
    }

    tracing::info!(comment_id = %comment.id, own_comment, "Comment admitted");
    AdmissionOutcome::Created {
        should_classify: !own_comment,
    }
}

/// Make sure a media row exists for the comment, fetching it from the
/// platform on first sight.
async fn ensure_media(
    pool: &PgPool,
    resolver: &dyn MediaResolver,
    media_id: &str,
) -> Result<(), AdmissionOutcome> {
    let media_error = || AdmissionOutcome::Error {
        reason: "failed_to_create_media".into(),
    };

    match MediaRepo::find_by_id(pool, media_id).await {
        Ok(Some(_)) => return Ok(()),
        Ok(None) => {}
        Err(err) => {
            tracing::error!(media_id = %media_id, error = %err, "Media lookup failed");
            return Err(media_error());
        }
    }

    let fetched = match resolver.resolve(media_id).await {
        Ok(fetched) => fetched,
        Err(err) => {
            tracing::error!(media_id = %media_id, error = %err, "Media resolution failed");
            return Err(media_error());
        }
    };

    match MediaRepo::upsert(pool, media_id, &fetched).await {
        Ok(_) => Ok(()),
        Err(err) => {
            tracing::error!(media_id = %media_id, error = %err, "Media upsert failed");
            Err(media_error())
        }
    }
}
