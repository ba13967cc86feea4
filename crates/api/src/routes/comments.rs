//! Moderation ops endpoints: inspect a comment's pipeline state and
//! request a manual hide/unhide.

use axum::extract::{Path, State};
use axum::{
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use modbot_core::error::CoreError;
use modbot_core::types::DbId;
use modbot_db::models::answer::Answer;
use modbot_db::models::classification::Classification;
use modbot_db::models::comment::Comment;
use modbot_db::repositories::{AnswerRepo, CommentRepo};
use modbot_queue::tasks::HideArgs;
use modbot_queue::{TaskName, TaskSpec};

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Full pipeline state of one comment.
#[derive(Debug, Serialize)]
pub struct CommentDetail {
    pub comment: Comment,
    pub classification: Option<Classification>,
    pub answer: Option<Answer>,
}

/// GET /api/v1/comments/{id} -- fetch a comment with its pipeline state.
async fn get_comment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<DataResponse<CommentDetail>>> {
    let Some((comment, classification)) =
        CommentRepo::find_with_classification(&state.pool, &id).await?
    else {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "comment",
            id,
        }));
    };
    let answer = AnswerRepo::find_by_comment(&state.pool, &id).await?;

    Ok(Json(DataResponse {
        data: CommentDetail {
            comment,
            classification,
            answer,
        },
    }))
}

#[derive(Debug, Deserialize)]
pub struct HideRequest {
    /// `true` to hide, `false` to unhide. Defaults to hide.
    #[serde(default = "default_hide")]
    pub hide: bool,
}

fn default_hide() -> bool {
    true
}

#[derive(Debug, Serialize)]
pub struct EnqueuedTask {
    pub task_id: DbId,
}

/// POST /api/v1/comments/{id}/hide -- queue a manual hide/unhide.
async fn hide_comment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<HideRequest>,
) -> AppResult<Json<DataResponse<EnqueuedTask>>> {
    if CommentRepo::find_by_id(&state.pool, &id).await?.is_none() {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "comment",
            id,
        }));
    }

    let spec = TaskSpec::new(
        TaskName::HideComment,
        HideArgs {
            comment_id: id,
            hide: request.hide,
            initiator: "manual".into(),
            retry_count: 0,
        },
    );
    let task_id = state.queue.enqueue(spec).await?;

    Ok(Json(DataResponse {
        data: EnqueuedTask { task_id },
    }))
}

/// Mount comment ops routes under `/comments`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}", get(get_comment))
        .route("/{id}/hide", post(hide_comment))
}
