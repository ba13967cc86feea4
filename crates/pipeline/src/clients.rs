//! HTTP-backed collaborator implementations.
//!
//! The binaries wire these against small internal services speaking
//! JSON: a model service for classification and answer generation, a
//! platform gateway for media lookups and comment side effects, and a
//! plain webhook URL for operator alerts. Platform specifics (auth,
//! vendor endpoints, rate-limit accounting) live behind the gateway
//! service, not here.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use modbot_core::error::CoreError;
use modbot_db::repositories::media_repo::UpsertMedia;

use crate::collaborators::{
    AlertNotifier, AnswerGenerator, AnswerRequest, CapabilityError, Classifier, ClassifierOutput,
    ClassifyRequest, CommentGateway, GatewayError, GeneratedAnswer, MediaResolver,
    ModerationAlert, ReplyReceipt,
};

/// HTTP request timeout for a single capability call. Model calls can be
/// slow; the task queue absorbs the latency.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Base URLs for the collaborator services.
///
/// | Env Var                | Meaning                                |
/// |------------------------|----------------------------------------|
/// | `MODEL_SERVICE_URL`    | Classification + answer generation     |
/// | `PLATFORM_GATEWAY_URL` | Media lookups, replies, hide/unhide    |
/// | `ALERT_WEBHOOK_URL`    | Operator alert delivery                |
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub model_service_url: String,
    pub gateway_url: String,
    pub alert_webhook_url: String,
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, CoreError> {
        let var = |name: &str| {
            std::env::var(name)
                .map_err(|_| CoreError::Validation(format!("{name} must be set")))
                .map(|v| v.trim_end_matches('/').to_string())
        };
        Ok(Self {
            model_service_url: var("MODEL_SERVICE_URL")?,
            gateway_url: var("PLATFORM_GATEWAY_URL")?,
            alert_webhook_url: var("ALERT_WEBHOOK_URL")?,
        })
    }
}

fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .expect("Failed to build reqwest HTTP client")
}

// ---------------------------------------------------------------------------
// Model service
// ---------------------------------------------------------------------------

/// Classifier backed by the model service's `/classify` endpoint.
pub struct HttpClassifier {
    client: reqwest::Client,
    base_url: String,
}

impl HttpClassifier {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: http_client(),
            base_url: base_url.into(),
        }
    }
}

#[derive(Deserialize)]
struct ClassifyResponse {
    label: String,
    confidence: Option<i32>,
    reasoning: Option<String>,
    input_tokens: Option<i32>,
    output_tokens: Option<i32>,
}

#[async_trait]
impl Classifier for HttpClassifier {
    async fn classify(&self, request: &ClassifyRequest) -> Result<ClassifierOutput, CapabilityError> {
        let payload = serde_json::json!({
            "comment_id": request.comment_id,
            "text": request.comment_text,
            "username": request.comment_username,
            "conversation_id": request.conversation_id,
            "media": {
                "type": request.media.media_type,
                "caption": request.media.caption,
                "context": request.media.media_context,
                "username": request.media.username,
                "permalink": request.media.permalink,
                "comments_count": request.media.comments_count,
                "like_count": request.media.like_count,
            },
        });

        let url = format!("{}/classify", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| CapabilityError::new(format!("classify request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(CapabilityError::new(format!(
                "classify returned HTTP {}",
                response.status().as_u16()
            )));
        }

        let body: ClassifyResponse = response
            .json()
            .await
            .map_err(|e| CapabilityError::new(format!("classify response malformed: {e}")))?;

        Ok(ClassifierOutput {
            label: body.label,
            confidence: body.confidence,
            reasoning: body.reasoning,
            input_tokens: body.input_tokens,
            output_tokens: body.output_tokens,
        })
    }
}

/// Answer generator backed by the model service's `/answer` endpoint.
pub struct HttpAnswerGenerator {
    client: reqwest::Client,
    base_url: String,
}

impl HttpAnswerGenerator {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: http_client(),
            base_url: base_url.into(),
        }
    }
}

#[derive(Deserialize)]
struct AnswerResponse {
    answer: String,
    confidence: Option<f64>,
    quality_score: Option<i32>,
    input_tokens: Option<i32>,
    output_tokens: Option<i32>,
    processing_time_ms: Option<i32>,
}

#[async_trait]
impl AnswerGenerator for HttpAnswerGenerator {
    async fn generate(&self, request: &AnswerRequest) -> Result<GeneratedAnswer, CapabilityError> {
        let payload = serde_json::json!({
            "comment_id": request.comment_id,
            "text": request.comment_text,
            "username": request.comment_username,
            "conversation_id": request.conversation_id,
            "reasoning": request.classification_reasoning,
            "media": {
                "caption": request.media.caption,
                "context": request.media.media_context,
            },
        });

        let url = format!("{}/answer", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| CapabilityError::new(format!("answer request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(CapabilityError::new(format!(
                "answer returned HTTP {}",
                response.status().as_u16()
            )));
        }

        let body: AnswerResponse = response
            .json()
            .await
            .map_err(|e| CapabilityError::new(format!("answer response malformed: {e}")))?;

        Ok(GeneratedAnswer {
            answer: body.answer,
            confidence: body.confidence,
            quality_score: body.quality_score,
            input_tokens: body.input_tokens,
            output_tokens: body.output_tokens,
            processing_time_ms: body.processing_time_ms,
        })
    }
}

// ---------------------------------------------------------------------------
// Platform gateway
// ---------------------------------------------------------------------------

/// Media resolver and comment gateway backed by the platform gateway
/// service.
pub struct HttpPlatformGateway {
    client: reqwest::Client,
    base_url: String,
}

impl HttpPlatformGateway {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: http_client(),
            base_url: base_url.into(),
        }
    }

    async fn gateway_error(response: reqwest::Response) -> GatewayError {
        let status = response.status();
        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<f64>().ok());

        #[derive(Deserialize, Default)]
        struct GatewayErrorBody {
            message: Option<String>,
            code: Option<i64>,
            is_transient: Option<bool>,
        }
        let body: GatewayErrorBody = response.json().await.unwrap_or_default();

        GatewayError {
            message: body
                .message
                .unwrap_or_else(|| format!("gateway returned HTTP {}", status.as_u16())),
            is_transient: body
                .is_transient
                .unwrap_or(status.as_u16() == 429 || status.is_server_error()),
            code: body.code,
            retry_after,
        }
    }
}

#[derive(Deserialize)]
struct MediaResponse {
    media_type: Option<String>,
    caption: Option<String>,
    media_url: Option<String>,
    permalink: Option<String>,
    username: Option<String>,
    comments_count: Option<i32>,
    like_count: Option<i32>,
    media_context: Option<String>,
    is_comment_enabled: Option<bool>,
}

#[async_trait]
impl MediaResolver for HttpPlatformGateway {
    async fn resolve(&self, media_id: &str) -> Result<UpsertMedia, CapabilityError> {
        let url = format!("{}/media/{media_id}", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| CapabilityError::new(format!("media lookup failed: {e}")))?;

        if !response.status().is_success() {
            return Err(CapabilityError::new(format!(
                "media lookup returned HTTP {}",
                response.status().as_u16()
            )));
        }

        let body: MediaResponse = response
            .json()
            .await
            .map_err(|e| CapabilityError::new(format!("media response malformed: {e}")))?;

        Ok(UpsertMedia {
            media_type: body.media_type,
            caption: body.caption,
            media_url: body.media_url,
            permalink: body.permalink,
            username: body.username,
            comments_count: body.comments_count,
            like_count: body.like_count,
            media_context: body.media_context,
            is_comment_enabled: body.is_comment_enabled,
        })
    }
}

#[derive(Deserialize)]
struct ReplyResponse {
    reply_id: Option<String>,
}

#[async_trait]
impl CommentGateway for HttpPlatformGateway {
    async fn send_reply(&self, comment_id: &str, text: &str) -> Result<ReplyReceipt, GatewayError> {
        let url = format!("{}/comments/{comment_id}/replies", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "text": text }))
            .send()
            .await
            .map_err(|e| GatewayError::transient(format!("reply request failed: {e}"), None))?;

        if !response.status().is_success() {
            return Err(Self::gateway_error(response).await);
        }

        let body: ReplyResponse = response.json().await.unwrap_or(ReplyResponse { reply_id: None });
        Ok(ReplyReceipt {
            reply_id: body.reply_id,
        })
    }

    async fn set_hidden(&self, comment_id: &str, hidden: bool) -> Result<(), GatewayError> {
        let url = format!("{}/comments/{comment_id}/visibility", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "hidden": hidden }))
            .send()
            .await
            .map_err(|e| GatewayError::transient(format!("hide request failed: {e}"), None))?;

        if !response.status().is_success() {
            return Err(Self::gateway_error(response).await);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Alerts
// ---------------------------------------------------------------------------

/// Alert notifier that POSTs the alert to a webhook URL.
pub struct WebhookAlertNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookAlertNotifier {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: http_client(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl AlertNotifier for WebhookAlertNotifier {
    async fn notify(&self, alert: &ModerationAlert) -> Result<(), CapabilityError> {
        let payload = serde_json::json!({
            "comment_id": alert.comment_id,
            "username": alert.username,
            "text": alert.text,
            "verdict": alert.verdict_label,
            "permalink": alert.permalink,
        });

        let response = self
            .client
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| CapabilityError::new(format!("alert delivery failed: {e}")))?;

        if !response.status().is_success() {
            return Err(CapabilityError::new(format!(
                "alert webhook returned HTTP {}",
                response.status().as_u16()
            )));
        }
        Ok(())
    }
}
