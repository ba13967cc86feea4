//! Comment entity models and DTOs.

use modbot_core::types::Timestamp;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `comments` table.
///
/// The id is the platform's own opaque comment id; creation under a
/// duplicate id fails on the primary key and is handled as a benign race.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Comment {
    pub id: String,
    pub media_id: String,
    pub parent_id: Option<String>,
    pub user_id: String,
    pub username: String,
    pub text: String,
    pub conversation_id: Option<String>,
    pub raw_data: serde_json::Value,
    pub is_hidden: bool,
    pub hidden_at: Option<Timestamp>,
    pub hidden_by_bot: bool,
    pub is_deleted: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for inserting a new comment from a webhook delivery.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateComment {
    pub id: String,
    pub media_id: String,
    pub parent_id: Option<String>,
    pub user_id: String,
    pub username: String,
    pub text: String,
    /// Comment creation time as reported by the webhook entry (UTC).
    pub created_at: Timestamp,
    pub raw_data: serde_json::Value,
}
