//! Side-effecting action stages: reply, hide, alert.
//!
//! Reply and hide mutate platform state, so each runs under a
//! distributed lock keyed by comment id. Lock acquisition is
//! non-blocking; a held lock means another worker is already on it and
//! this dispatch reports `Skipped`.

pub mod alert;
pub mod hide;
pub mod reply;

use std::time::Duration;

/// Default TTL for the action locks. Long enough to cover a slow gateway
/// call, short enough that a crashed holder does not stall the comment.
pub const DEFAULT_LOCK_TTL: Duration = Duration::from_secs(30);
