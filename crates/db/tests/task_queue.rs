//! Integration tests for the durable task queue repository.

use sqlx::PgPool;

use modbot_db::models::status::TaskStatus;
use modbot_db::models::task::NewTask;
use modbot_db::repositories::TaskRepo;

fn new_task(name: &str, countdown_secs: Option<i64>) -> NewTask {
    NewTask {
        task_name: name.to_string(),
        args: serde_json::json!({"comment_id": "c1", "retry_count": 0}),
        trace_id: Some("trace-1".into()),
        countdown_secs,
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn claim_returns_due_task_and_marks_it_running(pool: PgPool) {
    let queued = TaskRepo::enqueue(&pool, &new_task("classify_comment", None))
        .await
        .unwrap();
    assert_eq!(queued.status_id, TaskStatus::Pending.id());
    assert_eq!(queued.attempts, 0);

    let claimed = TaskRepo::claim_next(&pool).await.unwrap().unwrap();
    assert_eq!(claimed.id, queued.id);
    assert_eq!(claimed.status_id, TaskStatus::Running.id());
    assert_eq!(claimed.attempts, 1);
    assert!(claimed.claimed_at.is_some());
    assert_eq!(claimed.trace_id.as_deref(), Some("trace-1"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn claim_skips_tasks_with_future_run_at(pool: PgPool) {
    TaskRepo::enqueue(&pool, &new_task("classify_comment", Some(3600)))
        .await
        .unwrap();

    assert!(TaskRepo::claim_next(&pool).await.unwrap().is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn claim_orders_by_run_at(pool: PgPool) {
    // Backdate one task so its run_at sorts first.
    let late = TaskRepo::enqueue(&pool, &new_task("send_reply", None)).await.unwrap();
    let early = TaskRepo::enqueue(&pool, &new_task("classify_comment", None))
        .await
        .unwrap();
    sqlx::query("UPDATE tasks SET run_at = run_at - INTERVAL '1 minute' WHERE id = $1")
        .bind(early.id)
        .execute(&pool)
        .await
        .unwrap();

    let first = TaskRepo::claim_next(&pool).await.unwrap().unwrap();
    let second = TaskRepo::claim_next(&pool).await.unwrap().unwrap();
    assert_eq!(first.id, early.id);
    assert_eq!(second.id, late.id);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn claimed_task_is_not_claimable_again(pool: PgPool) {
    TaskRepo::enqueue(&pool, &new_task("hide_comment", None)).await.unwrap();

    assert!(TaskRepo::claim_next(&pool).await.unwrap().is_some());
    assert!(TaskRepo::claim_next(&pool).await.unwrap().is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn complete_and_fail_transitions(pool: PgPool) {
    let a = TaskRepo::enqueue(&pool, &new_task("send_alert", None)).await.unwrap();
    let b = TaskRepo::enqueue(&pool, &new_task("send_alert", None)).await.unwrap();

    TaskRepo::complete(&pool, a.id).await.unwrap();
    TaskRepo::fail(&pool, b.id, "notifier unreachable").await.unwrap();

    let done = TaskRepo::find_by_id(&pool, a.id).await.unwrap().unwrap();
    assert_eq!(done.status_id, TaskStatus::Completed.id());

    let failed = TaskRepo::find_by_id(&pool, b.id).await.unwrap().unwrap();
    assert_eq!(failed.status_id, TaskStatus::Failed.id());
    assert_eq!(failed.last_error.as_deref(), Some("notifier unreachable"));
}
