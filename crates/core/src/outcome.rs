//! Typed results returned by pipeline stages.
//!
//! Capability failures never escape a stage as errors; they are converted
//! into [`StageOutcome::Retry`] or [`StageOutcome::Error`] values for the
//! dispatch layer to act on. Only persistence failures propagate as
//! `Err(sqlx::Error)` so the task runtime's own failure handling engages.

use serde::{Deserialize, Serialize};

use crate::verdict::Verdict;

/// Result of one asynchronous stage invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StageOutcome {
    /// The stage ran to completion. Classification carries its verdict so
    /// the caller can route follow-up actions.
    Success { verdict: Option<Verdict> },

    /// Transient failure; the caller should re-dispatch after backoff.
    /// `retry_after` is a server-supplied hint in seconds, honored over
    /// the generic schedule.
    Retry {
        reason: String,
        retry_after: Option<f64>,
    },

    /// Terminal failure. No further automatic dispatch.
    Error { reason: String },

    /// The stage decided there was nothing to do (policy gate, lock held,
    /// state already as requested). Not a failure.
    Skipped { reason: String },
}

impl StageOutcome {
    pub fn retry(reason: impl Into<String>) -> Self {
        StageOutcome::Retry {
            reason: reason.into(),
            retry_after: None,
        }
    }

    pub fn retry_after(reason: impl Into<String>, secs: Option<f64>) -> Self {
        StageOutcome::Retry {
            reason: reason.into(),
            retry_after: secs,
        }
    }

    pub fn error(reason: impl Into<String>) -> Self {
        StageOutcome::Error {
            reason: reason.into(),
        }
    }

    pub fn skipped(reason: impl Into<String>) -> Self {
        StageOutcome::Skipped {
            reason: reason.into(),
        }
    }

    pub fn is_retry(&self) -> bool {
        matches!(self, StageOutcome::Retry { .. })
    }
}

/// Synchronous acknowledgement returned to the webhook caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AdmissionOutcome {
    /// A new comment row was committed.
    Created { should_classify: bool },

    /// The comment already existed (duplicate delivery or creation race).
    /// `should_classify` is false only when classification is COMPLETED.
    Exists { should_classify: bool },

    /// The event's owning account does not match this pipeline's account.
    Forbidden { reason: String },

    /// Admission could not complete (media resolution or persistence).
    Error { reason: String },
}

impl AdmissionOutcome {
    /// Whether the caller should (re-)enqueue classification.
    pub fn should_classify(&self) -> bool {
        match self {
            AdmissionOutcome::Created { should_classify }
            | AdmissionOutcome::Exists { should_classify } => *should_classify,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_helper_has_no_hint() {
        let o = StageOutcome::retry("rate_limited");
        assert!(o.is_retry());
        assert_eq!(
            o,
            StageOutcome::Retry {
                reason: "rate_limited".into(),
                retry_after: None
            }
        );
    }

    #[test]
    fn admission_should_classify() {
        assert!(AdmissionOutcome::Created {
            should_classify: true
        }
        .should_classify());
        assert!(!AdmissionOutcome::Exists {
            should_classify: false
        }
        .should_classify());
        assert!(!AdmissionOutcome::Forbidden {
            reason: "invalid_webhook_account".into()
        }
        .should_classify());
    }

    #[test]
    fn admission_outcome_serializes_with_status_tag() {
        let json = serde_json::to_value(AdmissionOutcome::Exists {
            should_classify: true,
        })
        .unwrap();
        assert_eq!(json["status"], "exists");
        assert_eq!(json["should_classify"], true);
    }
}
