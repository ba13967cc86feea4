//! Post-classification dispatch: turn a verdict into queued action tasks.
//!
//! Dispatch happens after the classification result is committed, so an
//! enqueue failure is logged and dropped rather than unwound into the
//! already-committed outcome. A lost enqueue is recoverable by
//! re-dispatching classification, which short-circuits to the stored
//! verdict.

use modbot_core::verdict::{routed_actions, RoutedAction, Verdict};
use modbot_queue::tasks::{AlertArgs, HideArgs, StageArgs, TaskSpec};
use modbot_queue::{TaskName, TaskQueue};

/// Build the task for one routed action.
pub fn action_task(action: RoutedAction, comment_id: &str) -> TaskSpec {
    match action {
        RoutedAction::GenerateAnswer => TaskSpec::new(
            TaskName::GenerateAnswer,
            StageArgs {
                comment_id: comment_id.to_string(),
                retry_count: 0,
            },
        ),
        RoutedAction::HideComment => TaskSpec::new(
            TaskName::HideComment,
            HideArgs {
                comment_id: comment_id.to_string(),
                hide: true,
                initiator: "bot".into(),
                retry_count: 0,
            },
        ),
        RoutedAction::SendAlert => TaskSpec::new(
            TaskName::SendAlert,
            AlertArgs {
                comment_id: comment_id.to_string(),
                retry_count: 0,
            },
        ),
    }
}

/// Enqueue every action the verdict routes to.
pub async fn dispatch_routed_actions(
    queue: &TaskQueue,
    comment_id: &str,
    verdict: &Verdict,
    trace_id: Option<&str>,
) {
    for action in routed_actions(verdict) {
        let mut spec = action_task(*action, comment_id);
        if let Some(trace_id) = trace_id {
            spec = spec.with_trace_id(trace_id);
        }
        let name = spec.name;
        if let Err(err) = queue.enqueue(spec).await {
            tracing::error!(
                comment_id = %comment_id,
                task_name = name.as_str(),
                error = %err,
                "Failed to enqueue routed action",
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn answer_task_carries_comment_id() {
        let spec = action_task(RoutedAction::GenerateAnswer, "c1");
        assert_eq!(spec.name, TaskName::GenerateAnswer);
        assert_eq!(spec.args["comment_id"], "c1");
        assert_eq!(spec.args["retry_count"], 0);
    }

    #[test]
    fn hide_task_is_bot_initiated() {
        let spec = action_task(RoutedAction::HideComment, "c1");
        assert_eq!(spec.name, TaskName::HideComment);
        assert_eq!(spec.args["hide"], true);
        assert_eq!(spec.args["initiator"], "bot");
    }

    #[test]
    fn alert_task_starts_at_attempt_zero() {
        let spec = action_task(RoutedAction::SendAlert, "c1");
        assert_eq!(spec.name, TaskName::SendAlert);
        assert_eq!(spec.args["retry_count"], 0);
    }
}
