//! Pipeline configuration loaded from environment variables.

use modbot_core::error::CoreError;

/// Identity and policy knobs for the pipeline.
///
/// | Env Var                 | Default | Meaning                            |
/// |-------------------------|---------|------------------------------------|
/// | `WEBHOOK_ACCOUNT_ID`    | —       | Account id webhooks must belong to |
/// | `BOT_USER_ID`           | ``      | Our own platform user id           |
/// | `ACTION_LOCK_TTL_SECS`  | `30`    | Distributed lock TTL for actions   |
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// The only account whose webhook events this pipeline accepts.
    pub account_id: String,
    /// Our own user id; comments we authored are stored but never
    /// classified, so the bot does not converse with itself.
    pub bot_user_id: Option<String>,
    /// TTL for the reply/hide distributed locks.
    pub action_lock_ttl_secs: u64,
}

impl PipelineConfig {
    /// Load configuration from environment variables.
    ///
    /// `WEBHOOK_ACCOUNT_ID` is required; everything else has defaults.
    pub fn from_env() -> Result<Self, CoreError> {
        let account_id = std::env::var("WEBHOOK_ACCOUNT_ID")
            .map_err(|_| CoreError::Validation("WEBHOOK_ACCOUNT_ID must be set".into()))?;

        let bot_user_id = std::env::var("BOT_USER_ID").ok().filter(|v| !v.is_empty());

        let action_lock_ttl_secs: u64 = std::env::var("ACTION_LOCK_TTL_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .map_err(|_| CoreError::Validation("ACTION_LOCK_TTL_SECS must be a valid u64".into()))?;

        Ok(Self {
            account_id,
            bot_user_id,
            action_lock_ttl_secs,
        })
    }

    /// Whether a comment author is the bot itself.
    pub fn is_own_user(&self, user_id: &str) -> bool {
        self.bot_user_id.as_deref() == Some(user_id)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            account_id: String::new(),
            bot_user_id: None,
            action_lock_ttl_secs: 30,
        }
    }
}
