//! Classification entity models and DTOs.

use modbot_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

use super::status::StatusId;

/// A row from the `classifications` table (one-to-one with a comment;
/// `comment_id` carries a unique constraint).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Classification {
    pub id: DbId,
    pub comment_id: String,
    pub status_id: StatusId,
    pub verdict: Option<String>,
    pub confidence: Option<i32>,
    pub reasoning: Option<String>,
    pub input_tokens: Option<i32>,
    pub output_tokens: Option<i32>,
    pub retry_count: i32,
    pub max_retries: i32,
    pub last_error: Option<String>,
    pub processing_started_at: Option<Timestamp>,
    pub processing_completed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Completed-classification fields persisted in one statement.
#[derive(Debug, Clone)]
pub struct ClassificationVerdict {
    pub verdict: String,
    pub confidence: Option<i32>,
    pub reasoning: Option<String>,
    pub input_tokens: Option<i32>,
    pub output_tokens: Option<i32>,
}
