//! Webhook ingestion: the synchronous admission surface.
//!
//! The platform redelivers webhooks on non-2xx responses, so this
//! endpoint always answers 200 with a typed ack; failures are reported
//! in the ack body, not the status code.

use axum::extract::State;
use axum::{routing::post, Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use modbot_core::outcome::AdmissionOutcome;
use modbot_core::types::Timestamp;
use modbot_db::models::comment::CreateComment;
use modbot_pipeline::admission::{admit, AdmissionRequest};
use modbot_queue::tasks::StageArgs;
use modbot_queue::{TaskName, TaskSpec};

use crate::response::DataResponse;
use crate::state::AppState;

/// One comment webhook event.
#[derive(Debug, Deserialize)]
pub struct CommentWebhook {
    /// Account the event belongs to, per the platform envelope.
    pub account_id: String,
    pub comment: CommentPayload,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CommentPayload {
    pub id: String,
    pub media_id: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    pub user_id: String,
    pub username: String,
    pub text: String,
    /// Comment creation time from the platform; defaults to receipt time.
    #[serde(default)]
    pub created_at: Option<Timestamp>,
}

/// POST /api/v1/webhooks/comments -- admit one comment event.
async fn receive_comment(
    State(state): State<AppState>,
    Json(webhook): Json<CommentWebhook>,
) -> Json<DataResponse<AdmissionOutcome>> {
    let comment_id = webhook.comment.id.clone();

    // The raw payload rides along on the comment row for auditing.
    let raw_data =
        serde_json::to_value(&webhook.comment).unwrap_or(serde_json::Value::Null);

    let request = AdmissionRequest {
        account_id: webhook.account_id,
        comment: CreateComment {
            id: webhook.comment.id,
            media_id: webhook.comment.media_id,
            parent_id: webhook.comment.parent_id,
            user_id: webhook.comment.user_id,
            username: webhook.comment.username,
            text: webhook.comment.text,
            created_at: webhook.comment.created_at.unwrap_or_else(Utc::now),
            raw_data,
        },
    };

    let outcome = admit(&state.pool, state.resolver.as_ref(), &state.pipeline, request).await;

    // Classification is queued after the ack is decided; a failed enqueue
    // is recovered by the next redelivery or the retry sweeper, so it
    // never turns a committed admission into an error ack.
    if outcome.should_classify() {
        let spec = TaskSpec::new(
            TaskName::ClassifyComment,
            StageArgs {
                comment_id: comment_id.clone(),
                retry_count: 0,
            },
        );
        if let Err(err) = state.queue.enqueue(spec).await {
            tracing::error!(
                comment_id = %comment_id,
                error = %err,
                "Failed to enqueue classification after admission",
            );
        }
    }

    Json(DataResponse { data: outcome })
}

/// Mount webhook routes under `/webhooks`.
pub fn router() -> Router<AppState> {
    Router::new().route("/comments", post(receive_comment))
}
