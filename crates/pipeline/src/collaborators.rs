//! Collaborator interfaces for the external capabilities the pipeline
//! consumes.
//!
//! The pipeline never talks to a platform API or a model provider
//! directly; it goes through these traits. Production wiring supplies
//! HTTP-backed implementations, tests supply mocks.

use async_trait::async_trait;

use modbot_db::repositories::media_repo::UpsertMedia;

/// Failure of a capability call (classifier, generator, notifier,
/// resolver). Carries only the message; every stage treats these as
/// retryable until its retry budget runs out.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct CapabilityError(pub String);

impl CapabilityError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Failure of a comment gateway call (reply or hide on the platform).
///
/// The platform distinguishes transient conditions (rate limits,
/// temporary backend trouble) from permanent ones, and may attach a
/// retry-after hint in seconds.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct GatewayError {
    pub message: String,
    pub is_transient: bool,
    /// Platform error code, when the response carried one.
    pub code: Option<i64>,
    /// Server-suggested wait before retrying, in seconds.
    pub retry_after: Option<f64>,
}

/// Platform error codes that indicate a transient backend condition even
/// when the transient flag is absent.
const TRANSIENT_PLATFORM_CODES: [i64; 2] = [1, 2];

impl GatewayError {
    pub fn permanent(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            is_transient: false,
            code: None,
            retry_after: None,
        }
    }

    pub fn transient(message: impl Into<String>, retry_after: Option<f64>) -> Self {
        Self {
            message: message.into(),
            is_transient: true,
            code: None,
            retry_after,
        }
    }

    /// Whether this failure is worth retrying.
    pub fn should_retry(&self) -> bool {
        self.is_transient
            || self
                .code
                .is_some_and(|c| TRANSIENT_PLATFORM_CODES.contains(&c))
    }
}

// ---------------------------------------------------------------------------
// Media resolution
// ---------------------------------------------------------------------------

/// Fetches media metadata from the platform when admission sees a comment
/// on a media row we have not cached yet.
#[async_trait]
pub trait MediaResolver: Send + Sync {
    async fn resolve(&self, media_id: &str) -> Result<UpsertMedia, CapabilityError>;
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Everything the classifier sees about one comment.
#[derive(Debug, Clone)]
pub struct ClassifyRequest {
    pub comment_id: String,
    pub comment_text: String,
    pub comment_username: String,
    pub conversation_id: String,
    /// Media the comment was posted under, flattened for the prompt.
    pub media: MediaSnapshot,
}

/// Prompt-relevant fields of the media row.
#[derive(Debug, Clone, Default)]
pub struct MediaSnapshot {
    pub media_type: Option<String>,
    pub caption: Option<String>,
    pub media_context: Option<String>,
    pub username: Option<String>,
    pub permalink: Option<String>,
    pub media_url: Option<String>,
    pub comments_count: Option<i32>,
    pub like_count: Option<i32>,
    pub is_comment_enabled: Option<bool>,
}

impl MediaSnapshot {
    pub fn from_media(media: &modbot_db::models::media::Media) -> Self {
        Self {
            media_type: media.media_type.clone(),
            caption: media.caption.clone(),
            media_context: media.media_context.clone(),
            username: media.username.clone(),
            permalink: media.permalink.clone(),
            media_url: media.media_url.clone(),
            comments_count: media.comments_count,
            like_count: media.like_count,
            is_comment_enabled: media.is_comment_enabled,
        }
    }
}

/// What the classifier produced for one comment.
#[derive(Debug, Clone)]
pub struct ClassifierOutput {
    /// Free-form verdict label, parsed into a `Verdict` at the boundary.
    pub label: String,
    /// Confidence in percent (0 to 100).
    pub confidence: Option<i32>,
    pub reasoning: Option<String>,
    pub input_tokens: Option<i32>,
    pub output_tokens: Option<i32>,
}

#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, request: &ClassifyRequest) -> Result<ClassifierOutput, CapabilityError>;
}

// ---------------------------------------------------------------------------
// Answer generation
// ---------------------------------------------------------------------------

/// Everything the answer generator sees about one question.
#[derive(Debug, Clone)]
pub struct AnswerRequest {
    pub comment_id: String,
    pub comment_text: String,
    pub comment_username: String,
    pub conversation_id: String,
    pub media: MediaSnapshot,
    /// Classifier reasoning, when available, for grounding the reply.
    pub classification_reasoning: Option<String>,
}

/// What the generator produced.
#[derive(Debug, Clone)]
pub struct GeneratedAnswer {
    pub answer: String,
    /// Confidence in the 0.0 to 1.0 range.
    pub confidence: Option<f64>,
    /// Quality self-assessment, 0 to 100.
    pub quality_score: Option<i32>,
    pub input_tokens: Option<i32>,
    pub output_tokens: Option<i32>,
    pub processing_time_ms: Option<i32>,
}

#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    async fn generate(&self, request: &AnswerRequest) -> Result<GeneratedAnswer, CapabilityError>;
}

// ---------------------------------------------------------------------------
// Comment gateway (platform side effects)
// ---------------------------------------------------------------------------

/// Confirmation of a delivered reply.
#[derive(Debug, Clone)]
pub struct ReplyReceipt {
    /// Platform id of the posted reply comment, when returned.
    pub reply_id: Option<String>,
}

/// The platform operations with external side effects. Both are guarded
/// by distributed locks at the call sites.
#[async_trait]
pub trait CommentGateway: Send + Sync {
    async fn send_reply(&self, comment_id: &str, text: &str) -> Result<ReplyReceipt, GatewayError>;

    async fn set_hidden(&self, comment_id: &str, hidden: bool) -> Result<(), GatewayError>;
}

// ---------------------------------------------------------------------------
// Alerts
// ---------------------------------------------------------------------------

/// Operator alert raised for comments that need human attention.
#[derive(Debug, Clone)]
pub struct ModerationAlert {
    pub comment_id: String,
    pub username: String,
    pub text: String,
    pub verdict_label: String,
    pub permalink: Option<String>,
}

#[async_trait]
pub trait AlertNotifier: Send + Sync {
    async fn notify(&self, alert: &ModerationAlert) -> Result<(), CapabilityError>;
}
