//! Integration tests for the answer generation stage.

mod common;

use sqlx::PgPool;

use common::{seed_comment, MockGenerator};
use modbot_core::outcome::StageOutcome;
use modbot_db::models::status::ProcessingStatus;
use modbot_db::repositories::AnswerRepo;
use modbot_pipeline::answer::generate_answer;

#[sqlx::test(migrations = "../../db/migrations")]
async fn happy_path_persists_the_answer(pool: PgPool) {
    seed_comment(&pool, "c1").await;
    let generator = MockGenerator::ok();

    let outcome = generate_answer(&pool, &generator, "c1", 0).await.unwrap();

    assert_eq!(outcome, StageOutcome::Success { verdict: None });
    assert_eq!(generator.call_count(), 1);

    let row = AnswerRepo::find_by_comment(&pool, "c1").await.unwrap().unwrap();
    assert_eq!(row.status_id, ProcessingStatus::Completed.id());
    assert_eq!(row.answer.as_deref(), Some("Yes, we ship worldwide."));
    assert_eq!(row.quality_score, Some(88));
    assert!(!row.reply_sent);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn populated_answer_short_circuits(pool: PgPool) {
    seed_comment(&pool, "c1").await;
    let first = MockGenerator::ok();
    generate_answer(&pool, &first, "c1", 0).await.unwrap();

    let second = MockGenerator::ok();
    let outcome = generate_answer(&pool, &second, "c1", 0).await.unwrap();

    assert_eq!(outcome, StageOutcome::Success { verdict: None });
    assert_eq!(second.call_count(), 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn unknown_comment_is_a_terminal_error(pool: PgPool) {
    let generator = MockGenerator::ok();

    let outcome = generate_answer(&pool, &generator, "ghost", 0).await.unwrap();

    assert_eq!(outcome, StageOutcome::error("comment_not_found"));
    assert_eq!(generator.call_count(), 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn failure_within_budget_schedules_retry(pool: PgPool) {
    seed_comment(&pool, "c1").await;
    let generator = MockGenerator::failing();

    let outcome = generate_answer(&pool, &generator, "c1", 2).await.unwrap();

    assert!(outcome.is_retry());
    let row = AnswerRepo::find_by_comment(&pool, "c1").await.unwrap().unwrap();
    assert_eq!(row.status_id, ProcessingStatus::Retry.id());
    // The row records the attempt that failed, not the one to come.
    assert_eq!(row.retry_count, 2);
    assert_eq!(row.last_error.as_deref(), Some("generator unavailable"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn failure_at_budget_is_terminal(pool: PgPool) {
    seed_comment(&pool, "c1").await;
    let generator = MockGenerator::failing();

    let outcome = generate_answer(&pool, &generator, "c1", 5).await.unwrap();

    assert_eq!(outcome, StageOutcome::error("answer_generation_failed"));
    let row = AnswerRepo::find_by_comment(&pool, "c1").await.unwrap().unwrap();
    assert_eq!(row.status_id, ProcessingStatus::Failed.id());
    assert_eq!(row.retry_count, 5);
}
