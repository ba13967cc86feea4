//! The comment moderation pipeline.
//!
//! Four stages, each invoked as a background task (except admission,
//! which runs synchronously inside the webhook request):
//!
//! 1. admission: validate, persist, and acknowledge an incoming comment
//! 2. classification: decide what kind of comment it is
//! 3. answer generation: draft a reply for questions
//! 4. actions: reply / hide / alert, guarded by distributed locks
//!
//! Stages return [`modbot_core::outcome::StageOutcome`] values; only
//! persistence and lock-store failures surface as `Err`.

pub mod actions;
pub mod admission;
pub mod answer;
pub mod classification;
pub mod clients;
pub mod collaborators;
pub mod config;
pub mod routing;

use modbot_queue::lock::LockError;

/// Infrastructure failure inside a stage. Capability failures never take
/// this path; they become `StageOutcome` values instead.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Db(#[from] sqlx::Error),

    #[error(transparent)]
    Lock(#[from] LockError),
}
