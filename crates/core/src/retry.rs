//! Shared retry schedule for every pipeline stage.
//!
//! Classification, answer generation, and the side-effecting actions all
//! back off on the same fixed schedule so retry behavior is uniform
//! across the pipeline. The schedule values are tunable constants, not
//! part of any external contract.

use std::time::Duration;

/// Backoff delays indexed by attempt number (0-based).
pub const RETRY_SCHEDULE: [Duration; 5] = [
    Duration::from_secs(15),
    Duration::from_secs(60),
    Duration::from_secs(300),
    Duration::from_secs(900),
    Duration::from_secs(3600),
];

/// Maximum number of retries before a stage gives up.
pub const MAX_RETRIES: u32 = RETRY_SCHEDULE.len() as u32;

/// Return the backoff delay for the given attempt.
///
/// Attempts past the end of the schedule reuse the final entry.
pub fn retry_delay(attempt: u32) -> Duration {
    let idx = (attempt as usize).min(RETRY_SCHEDULE.len() - 1);
    RETRY_SCHEDULE[idx]
}

/// Compute the countdown before a retry is re-dispatched.
///
/// A server-supplied `retry_after` hint (seconds) takes precedence over
/// the generic schedule but is clamped to at least the schedule's delay
/// for this attempt, so a tiny hint cannot collapse the backoff floor.
pub fn retry_countdown(attempt: u32, retry_after: Option<f64>) -> Duration {
    let fallback = retry_delay(attempt);
    match retry_after {
        Some(secs) if secs.is_finite() && secs > 0.0 => {
            Duration::from_secs(secs.ceil() as u64).max(fallback)
        }
        _ => fallback,
    }
}
