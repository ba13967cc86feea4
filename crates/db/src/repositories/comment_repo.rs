//! Repository for the `comments` table.
//!
//! Insertion is the ordering arbiter for webhook admission: the primary
//! key rejects duplicate deliveries that race past the existence check,
//! and callers treat the conflict as benign via
//! [`crate::is_unique_violation`].

use sqlx::PgPool;

use crate::models::classification::Classification;
use crate::models::comment::{Comment, CreateComment};

/// Column list for `comments` queries.
const COLUMNS: &str = "\
    id, media_id, parent_id, user_id, username, text, conversation_id, \
    raw_data, is_hidden, hidden_at, hidden_by_bot, is_deleted, \
    created_at, updated_at";

/// Provides persistence operations for comments.
pub struct CommentRepo;

impl CommentRepo {
    /// Insert a new comment row.
    ///
    /// Fails with a unique violation if the id already exists; the caller
    /// decides whether that is a race or a bug.
    pub async fn insert(pool: &PgPool, input: &CreateComment) -> Result<Comment, sqlx::Error> {
        let query = format!(
            "INSERT INTO comments \
                 (id, media_id, parent_id, user_id, username, text, created_at, raw_data) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Comment>(&query)
            .bind(&input.id)
            .bind(&input.media_id)
            .bind(&input.parent_id)
            .bind(&input.user_id)
            .bind(&input.username)
            .bind(&input.text)
            .bind(input.created_at)
            .bind(&input.raw_data)
            .fetch_one(pool)
            .await
    }

    /// Find a comment by its platform id.
    pub async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Comment>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM comments WHERE id = $1");
        sqlx::query_as::<_, Comment>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Fetch a comment together with its classification row, if any.
    pub async fn find_with_classification(
        pool: &PgPool,
        id: &str,
    ) -> Result<Option<(Comment, Option<Classification>)>, sqlx::Error> {
        let Some(comment) = Self::find_by_id(pool, id).await? else {
            return Ok(None);
        };
        let classification =
            crate::repositories::ClassificationRepo::find_by_comment(pool, id).await?;
        Ok(Some((comment, classification)))
    }

    /// Memoize the derived conversation id on the comment row.
    pub async fn set_conversation_id(
        pool: &PgPool,
        id: &str,
        conversation_id: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE comments SET conversation_id = $2, updated_at = NOW() \
             WHERE id = $1 AND conversation_id IS NULL",
        )
        .bind(id)
        .bind(conversation_id)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Flip the hidden flag after a confirmed external hide/unhide.
    ///
    /// Only a successful gateway call may reach this; failures leave the
    /// local state untouched.
    pub async fn set_hidden(
        pool: &PgPool,
        id: &str,
        hidden: bool,
        by_bot: bool,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE comments \
             SET is_hidden = $2, \
                 hidden_at = CASE WHEN $2 THEN NOW() ELSE NULL END, \
                 hidden_by_bot = $3, \
                 updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(hidden)
        .bind(hidden && by_bot)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Count rows for a given comment id (used by admission tests).
    pub async fn count_by_id(pool: &PgPool, id: &str) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM comments WHERE id = $1")
            .bind(id)
            .fetch_one(pool)
            .await?;
        Ok(count)
    }
}
