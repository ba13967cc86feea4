//! Repository for the `media` table.
//!
//! The authoritative media data lives with the external media service;
//! this repo only caches what the resolver fetched, upserting on id so
//! repeated resolutions refresh the readiness signals.

use sqlx::PgPool;

use crate::models::media::Media;

/// Column list for `media` queries.
const COLUMNS: &str = "\
    id, media_type, caption, media_url, permalink, username, \
    comments_count, like_count, media_context, is_comment_enabled, \
    is_processing_enabled, created_at, updated_at";

/// Fields the resolver writes when caching a media row.
#[derive(Debug, Clone, Default)]
pub struct UpsertMedia {
    pub media_type: Option<String>,
    pub caption: Option<String>,
    pub media_url: Option<String>,
    pub permalink: Option<String>,
    pub username: Option<String>,
    pub comments_count: Option<i32>,
    pub like_count: Option<i32>,
    pub media_context: Option<String>,
    pub is_comment_enabled: Option<bool>,
}

/// Provides persistence operations for cached media rows.
pub struct MediaRepo;

impl MediaRepo {
    /// Find a media row by its platform id.
    pub async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Media>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM media WHERE id = $1");
        sqlx::query_as::<_, Media>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Insert or refresh a media row from freshly fetched platform data.
    ///
    /// `is_processing_enabled` is an operator switch and is deliberately
    /// not overwritten by the upsert.
    pub async fn upsert(
        pool: &PgPool,
        id: &str,
        input: &UpsertMedia,
    ) -> Result<Media, sqlx::Error> {
        let query = format!(
            "INSERT INTO media \
                 (id, media_type, caption, media_url, permalink, username, \
                  comments_count, like_count, media_context, is_comment_enabled) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             ON CONFLICT (id) DO UPDATE SET \
                 media_type = EXCLUDED.media_type, \
                 caption = EXCLUDED.caption, \
                 media_url = EXCLUDED.media_url, \
                 permalink = EXCLUDED.permalink, \
                 username = EXCLUDED.username, \
                 comments_count = EXCLUDED.comments_count, \
                 like_count = EXCLUDED.like_count, \
                 media_context = COALESCE(EXCLUDED.media_context, media.media_context), \
                 is_comment_enabled = EXCLUDED.is_comment_enabled, \
                 updated_at = NOW() \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Media>(&query)
            .bind(id)
            .bind(&input.media_type)
            .bind(&input.caption)
            .bind(&input.media_url)
            .bind(&input.permalink)
            .bind(&input.username)
            .bind(input.comments_count)
            .bind(input.like_count)
            .bind(&input.media_context)
            .bind(input.is_comment_enabled)
            .fetch_one(pool)
            .await
    }
}
