//! JobQueue retry/backoff/dead-letter behavior (spec §4.3 "per-job retry
//! with exponential backoff (base 1s, three attempts), dead-letter
//! semantics after exhaustion").

mod common;

use ski_core::config::Tunables;
use ski_core::error::AppError;
use ski_core::jobqueue::{HandlerFuture, JobQueue};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn a_job_that_always_fails_is_dead_lettered_after_three_attempts() {
    let (warm, _db) = common::warm().await;
    let jobs = JobQueue::start(warm.clone(), Tunables::default());

    let attempts = Arc::new(AtomicUsize::new(0));
    let counter = attempts.clone();
    jobs.register(
        "test.always_fails",
        Arc::new(move |_payload| {
            let counter = counter.clone();
            Box::pin(async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(AppError::Validation("synthetic failure".to_string()))
            }) as HandlerFuture
        }),
    );

    jobs.enqueue("test.always_fails", serde_json::json!({"n": 1}));

    // Backoff is 1s, 2s between the three attempts; poll for the
    // dead-letter row rather than sleeping the worst case up front.
    let mut found = false;
    for _ in 0..40 {
        tokio::time::sleep(Duration::from_millis(250)).await;
        let row: Option<(i64,)> =
            sqlx::query_as("SELECT 1 FROM job_dead_letters WHERE topic = 'test.always_fails'")
                .fetch_optional(warm.pool())
                .await
                .unwrap();
        if row.is_some() {
            found = true;
            break;
        }
    }

    assert!(found, "a job that never succeeds must be dead-lettered");
    assert_eq!(attempts.load(Ordering::SeqCst), 3, "exactly three attempts before dead-lettering");
}

#[tokio::test]
async fn a_job_that_succeeds_on_retry_is_never_dead_lettered() {
    let (warm, _db) = common::warm().await;
    let jobs = JobQueue::start(warm.clone(), Tunables::default());

    let attempts = Arc::new(AtomicUsize::new(0));
    let counter = attempts.clone();
    jobs.register(
        "test.succeeds_second_try",
        Arc::new(move |_payload| {
            let counter = counter.clone();
            Box::pin(async move {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                if n < 2 {
                    Err(AppError::Validation("transient".to_string()))
                } else {
                    Ok(())
                }
            }) as HandlerFuture
        }),
    );

    jobs.enqueue("test.succeeds_second_try", serde_json::json!({"n": 1}));
    tokio::time::sleep(Duration::from_millis(1_500)).await;

    assert_eq!(attempts.load(Ordering::SeqCst), 2);
    let row: Option<(i64,)> =
        sqlx::query_as("SELECT 1 FROM job_dead_letters WHERE topic = 'test.succeeds_second_try'")
            .fetch_optional(warm.pool())
            .await
            .unwrap();
    assert!(row.is_none());
}
