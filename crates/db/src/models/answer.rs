//! Answer entity models and DTOs.

use modbot_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

use super::status::StatusId;

/// A row from the `answers` table (one-to-one with a comment).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Answer {
    pub id: DbId,
    pub comment_id: String,
    pub status_id: StatusId,
    pub answer: Option<String>,
    pub confidence: Option<f64>,
    pub quality_score: Option<i32>,
    pub input_tokens: Option<i32>,
    pub output_tokens: Option<i32>,
    pub processing_time_ms: Option<i32>,
    pub retry_count: i32,
    pub max_retries: i32,
    pub last_error: Option<String>,
    pub reply_sent: bool,
    pub reply_sent_at: Option<Timestamp>,
    pub reply_status: Option<String>,
    pub reply_error: Option<String>,
    pub reply_id: Option<String>,
    pub processing_started_at: Option<Timestamp>,
    pub processing_completed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Completed-answer fields persisted in one statement.
#[derive(Debug, Clone)]
pub struct AnswerContent {
    pub answer: String,
    pub confidence: Option<f64>,
    pub quality_score: Option<i32>,
    pub input_tokens: Option<i32>,
    pub output_tokens: Option<i32>,
    pub processing_time_ms: Option<i32>,
}
