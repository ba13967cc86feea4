//! Media entity model.
//!
//! Media rows are owned by the external media service; the pipeline reads
//! the processing-readiness signals and writes nothing but what the
//! resolver fetched.

use modbot_core::types::Timestamp;
use serde::Serialize;
use sqlx::FromRow;

/// Media types whose classification waits for visual context.
const VISUAL_MEDIA_TYPES: [&str; 2] = ["IMAGE", "CAROUSEL_ALBUM"];

/// A row from the `media` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Media {
    pub id: String,
    pub media_type: Option<String>,
    pub caption: Option<String>,
    pub media_url: Option<String>,
    pub permalink: Option<String>,
    pub username: Option<String>,
    pub comments_count: Option<i32>,
    pub like_count: Option<i32>,
    /// Description produced by the asynchronous media-analysis service.
    pub media_context: Option<String>,
    pub is_comment_enabled: Option<bool>,
    pub is_processing_enabled: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Media {
    /// Whether this media type needs visual context before classification.
    ///
    /// Only image-bearing media with a URL to analyze can ever produce
    /// context; video never waits.
    pub fn requires_visual_context(&self) -> bool {
        let is_visual = self
            .media_type
            .as_deref()
            .is_some_and(|t| VISUAL_MEDIA_TYPES.contains(&t));
        is_visual && self.media_url.is_some()
    }

    /// Whether the media-analysis service has produced context yet.
    pub fn visual_context_ready(&self) -> bool {
        self.media_context
            .as_deref()
            .is_some_and(|c| !c.is_empty())
    }
}
