//! Shared fixtures and collaborator mocks for pipeline stage tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;

use modbot_db::models::comment::CreateComment;
use modbot_db::repositories::media_repo::UpsertMedia;
use modbot_db::repositories::{CommentRepo, MediaRepo};
use modbot_pipeline::collaborators::{
    AlertNotifier, AnswerGenerator, AnswerRequest, CapabilityError, Classifier, ClassifierOutput,
    ClassifyRequest, CommentGateway, GatewayError, GeneratedAnswer, MediaResolver,
    ModerationAlert, ReplyReceipt,
};

// ---------------------------------------------------------------------------
// Seeding
// ---------------------------------------------------------------------------

pub async fn seed_media(pool: &PgPool, id: &str, media_type: &str, context: Option<&str>) {
    MediaRepo::upsert(
        pool,
        id,
        &UpsertMedia {
            media_type: Some(media_type.into()),
            caption: Some("spring collection".into()),
            media_url: Some("https://cdn.example/img.jpg".into()),
            media_context: context.map(Into::into),
            ..Default::default()
        },
    )
    .await
    .expect("seed media");
}

pub fn new_comment(id: &str, media_id: &str) -> CreateComment {
    CreateComment {
        id: id.to_string(),
        media_id: media_id.to_string(),
        parent_id: None,
        user_id: "u1".into(),
        username: "someone".into(),
        text: "do you ship to Norway?".into(),
        created_at: Utc::now(),
        raw_data: serde_json::json!({}),
    }
}

pub async fn seed_comment(pool: &PgPool, id: &str) {
    seed_media(pool, "m1", "IMAGE", Some("a red jacket on a rack")).await;
    CommentRepo::insert(pool, &new_comment(id, "m1"))
        .await
        .expect("seed comment");
}

// ---------------------------------------------------------------------------
// Classifier mock
// ---------------------------------------------------------------------------

pub struct MockClassifier {
    pub label: String,
    pub fail: bool,
    pub calls: AtomicUsize,
}

impl MockClassifier {
    pub fn returning(label: &str) -> Self {
        Self {
            label: label.to_string(),
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            label: String::new(),
            fail: true,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Classifier for MockClassifier {
    async fn classify(&self, _request: &ClassifyRequest) -> Result<ClassifierOutput, CapabilityError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(CapabilityError::new("model unavailable"));
        }
        Ok(ClassifierOutput {
            label: self.label.clone(),
            confidence: Some(90),
            reasoning: Some("test reasoning".into()),
            input_tokens: Some(100),
            output_tokens: Some(10),
        })
    }
}

// ---------------------------------------------------------------------------
// Answer generator mock
// ---------------------------------------------------------------------------

pub struct MockGenerator {
    pub fail: bool,
    pub calls: AtomicUsize,
}

impl MockGenerator {
    pub fn ok() -> Self {
        Self {
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AnswerGenerator for MockGenerator {
    async fn generate(&self, _request: &AnswerRequest) -> Result<GeneratedAnswer, CapabilityError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(CapabilityError::new("generator unavailable"));
        }
        Ok(GeneratedAnswer {
            answer: "Yes, we ship worldwide.".into(),
            confidence: Some(0.95),
            quality_score: Some(88),
            input_tokens: Some(250),
            output_tokens: Some(20),
            processing_time_ms: Some(800),
        })
    }
}

// ---------------------------------------------------------------------------
// Gateway mock
// ---------------------------------------------------------------------------

#[derive(Clone, Copy)]
pub enum GatewayMode {
    Ok,
    /// Transient failure with a server retry-after hint in seconds.
    RateLimited(f64),
    /// Non-transient flag but a platform code from the transient set.
    TransientCode(i64),
    Permanent,
}

pub struct MockGateway {
    pub mode: GatewayMode,
    pub reply_calls: AtomicUsize,
    pub hide_calls: AtomicUsize,
    pub last_reply_text: Mutex<Option<String>>,
}

impl MockGateway {
    pub fn new(mode: GatewayMode) -> Self {
        Self {
            mode,
            reply_calls: AtomicUsize::new(0),
            hide_calls: AtomicUsize::new(0),
            last_reply_text: Mutex::new(None),
        }
    }

    pub fn reply_call_count(&self) -> usize {
        self.reply_calls.load(Ordering::SeqCst)
    }

    pub fn hide_call_count(&self) -> usize {
        self.hide_calls.load(Ordering::SeqCst)
    }

    fn error(&self) -> Option<GatewayError> {
        match self.mode {
            GatewayMode::Ok => None,
            GatewayMode::RateLimited(hint) => {
                Some(GatewayError::transient("rate limited", Some(hint)))
            }
            GatewayMode::TransientCode(code) => Some(GatewayError {
                message: "platform backend error".into(),
                is_transient: false,
                code: Some(code),
                retry_after: None,
            }),
            GatewayMode::Permanent => Some(GatewayError::permanent("comment deleted")),
        }
    }
}

#[async_trait]
impl CommentGateway for MockGateway {
    async fn send_reply(&self, _comment_id: &str, text: &str) -> Result<ReplyReceipt, GatewayError> {
        self.reply_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_reply_text.lock().unwrap() = Some(text.to_string());
        match self.error() {
            Some(err) => Err(err),
            None => Ok(ReplyReceipt {
                reply_id: Some("r42".into()),
            }),
        }
    }

    async fn set_hidden(&self, _comment_id: &str, _hidden: bool) -> Result<(), GatewayError> {
        self.hide_calls.fetch_add(1, Ordering::SeqCst);
        match self.error() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Resolver and notifier mocks
// ---------------------------------------------------------------------------

pub struct MockResolver {
    pub fail: bool,
    pub calls: AtomicUsize,
}

impl MockResolver {
    pub fn ok() -> Self {
        Self {
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaResolver for MockResolver {
    async fn resolve(&self, _media_id: &str) -> Result<UpsertMedia, CapabilityError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(CapabilityError::new("platform unreachable"));
        }
        Ok(UpsertMedia {
            media_type: Some("VIDEO".into()),
            caption: Some("new drop".into()),
            media_url: Some("https://cdn.example/clip.mp4".into()),
            ..Default::default()
        })
    }
}

pub struct MockNotifier {
    pub fail: bool,
    pub calls: AtomicUsize,
}

impl MockNotifier {
    pub fn ok() -> Self {
        Self {
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AlertNotifier for MockNotifier {
    async fn notify(&self, _alert: &ModerationAlert) -> Result<(), CapabilityError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(CapabilityError::new("notifier unreachable"));
        }
        Ok(())
    }
}
