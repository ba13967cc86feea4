//! Shared fixtures for the task-flow tests: a [`StageRunner`] wired with
//! in-process mocks, plus seed and queue-inspection helpers.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;

use modbot_db::models::comment::CreateComment;
use modbot_db::models::status::TaskStatus;
use modbot_db::models::task::Task;
use modbot_db::repositories::media_repo::UpsertMedia;
use modbot_db::repositories::{CommentRepo, MediaRepo};
use modbot_pipeline::collaborators::{
    AlertNotifier, AnswerGenerator, AnswerRequest, CapabilityError, Classifier, ClassifierOutput,
    ClassifyRequest, CommentGateway, GatewayError, GeneratedAnswer, MediaResolver, ModerationAlert,
    ReplyReceipt,
};
use modbot_queue::lock::MemoryLockStore;
use modbot_queue::TaskQueue;
use modbot_worker::executor::StageRunner;

// ---------------------------------------------------------------------------
// Seeding
// ---------------------------------------------------------------------------

pub async fn seed_media(pool: &PgPool, id: &str, context: Option<&str>) {
    MediaRepo::upsert(
        pool,
        id,
        &UpsertMedia {
            media_type: Some("IMAGE".into()),
            caption: Some("spring collection".into()),
            media_url: Some("https://cdn.example/img.jpg".into()),
            media_context: context.map(Into::into),
            ..Default::default()
        },
    )
    .await
    .expect("seed media");
}

pub async fn seed_comment(pool: &PgPool, id: &str) {
    seed_media(pool, "m1", Some("a red jacket on a rack")).await;
    CommentRepo::insert(
        pool,
        &CreateComment {
            id: id.to_string(),
            media_id: "m1".into(),
            parent_id: None,
            user_id: "u1".into(),
            username: "someone".into(),
            text: "do you ship to Norway?".into(),
            created_at: Utc::now(),
            raw_data: serde_json::json!({}),
        },
    )
    .await
    .expect("seed comment");
}

/// All tasks still pending in the queue, oldest first.
pub async fn pending_tasks(pool: &PgPool) -> Vec<Task> {
    sqlx::query_as::<_, Task>(
        "SELECT id, task_name, args, trace_id, status_id, run_at, claimed_at, \
                attempts, last_error, created_at, updated_at \
         FROM tasks WHERE status_id = $1 ORDER BY id ASC",
    )
    .bind(TaskStatus::Pending.id())
    .fetch_all(pool)
    .await
    .expect("list pending tasks")
}

// ---------------------------------------------------------------------------
// Collaborator mocks
// ---------------------------------------------------------------------------

pub struct ScriptedClassifier {
    pub label: String,
    pub fail: bool,
    pub calls: AtomicUsize,
}

impl ScriptedClassifier {
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
impl Classifier for ScriptedClassifier {
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

pub struct ScriptedResolver {
    pub calls: AtomicUsize,
}

impl ScriptedResolver {
    pub fn ok() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaResolver for ScriptedResolver {
    async fn resolve(&self, _media_id: &str) -> Result<UpsertMedia, CapabilityError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(UpsertMedia {
            media_type: Some("VIDEO".into()),
            caption: Some("new drop".into()),
            ..Default::default()
        })
    }
}

pub struct ScriptedGenerator {
    pub calls: AtomicUsize,
}

impl ScriptedGenerator {
    pub fn ok() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AnswerGenerator for ScriptedGenerator {
    async fn generate(&self, _request: &AnswerRequest) -> Result<GeneratedAnswer, CapabilityError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
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

pub struct ScriptedGateway {
    pub reply_calls: AtomicUsize,
    pub hide_calls: AtomicUsize,
}

impl ScriptedGateway {
    pub fn ok() -> Self {
        Self {
            reply_calls: AtomicUsize::new(0),
            hide_calls: AtomicUsize::new(0),
        }
    }

    pub fn reply_call_count(&self) -> usize {
        self.reply_calls.load(Ordering::SeqCst)
    }

    pub fn hide_call_count(&self) -> usize {
        self.hide_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CommentGateway for ScriptedGateway {
    async fn send_reply(&self, _comment_id: &str, _text: &str) -> Result<ReplyReceipt, GatewayError> {
        self.reply_calls.fetch_add(1, Ordering::SeqCst);
        Ok(ReplyReceipt {
            reply_id: Some("r42".into()),
        })
    }

    async fn set_hidden(&self, _comment_id: &str, _hidden: bool) -> Result<(), GatewayError> {
        self.hide_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub struct ScriptedNotifier {
    pub calls: AtomicUsize,
}

impl ScriptedNotifier {
    pub fn ok() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AlertNotifier for ScriptedNotifier {
    async fn notify(&self, _alert: &ModerationAlert) -> Result<(), CapabilityError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Runner wiring
// ---------------------------------------------------------------------------

/// The mocks behind a runner, kept so tests can assert on call counts.
pub struct Mocks {
    pub classifier: Arc<ScriptedClassifier>,
    pub resolver: Arc<ScriptedResolver>,
    pub generator: Arc<ScriptedGenerator>,
    pub gateway: Arc<ScriptedGateway>,
    pub notifier: Arc<ScriptedNotifier>,
}

pub fn build_runner(pool: &PgPool, classifier: ScriptedClassifier) -> (StageRunner, Mocks) {
    let mocks = Mocks {
        classifier: Arc::new(classifier),
        resolver: Arc::new(ScriptedResolver::ok()),
        generator: Arc::new(ScriptedGenerator::ok()),
        gateway: Arc::new(ScriptedGateway::ok()),
        notifier: Arc::new(ScriptedNotifier::ok()),
    };
    let runner = StageRunner::new(
        pool.clone(),
        TaskQueue::new(pool.clone()),
        Arc::new(MemoryLockStore::new()),
        mocks.classifier.clone(),
        mocks.resolver.clone(),
        mocks.generator.clone(),
        mocks.gateway.clone(),
        mocks.notifier.clone(),
        Duration::from_secs(30),
    );
    (runner, mocks)
}
