//! `job_dead_letters` — where a job lands after exhausting its retry
//! budget (spec §4.3, §9 "retry discipline").

use super::WarmClient;
use crate::error::AppError;
use sqlx::SqlitePool;

pub struct DeadLetterRepository<'a> {
    pool: &'a SqlitePool,
    warm: &'a WarmClient,
}

impl<'a> DeadLetterRepository<'a> {
    pub(super) fn new(pool: &'a SqlitePool, warm: &'a WarmClient) -> Self {
        Self { pool, warm }
    }

    pub async fn insert(&self, topic: &str, payload: &str, last_error: &str, failed_at: i64) -> Result<(), AppError> {
        self.warm
            .with_timeout(
                "dead_letters_insert",
                sqlx::query("INSERT INTO job_dead_letters (topic, payload, last_error, failed_at) VALUES (?, ?, ?, ?)")
                    .bind(topic)
                    .bind(payload)
                    .bind(last_error)
                    .bind(failed_at)
                    .execute(self.pool),
            )
            .await?;
        Ok(())
    }
}
