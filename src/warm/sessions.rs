//! `ski_sessions` CRUD (spec §3 Session, §4.2).

use super::WarmClient;
use crate::error::AppError;
use crate::model::Session;
use sqlx::SqlitePool;

pub struct SessionRepository<'a> {
    pool: &'a SqlitePool,
    warm: &'a WarmClient,
}

impl<'a> SessionRepository<'a> {
    pub(super) fn new(pool: &'a SqlitePool, warm: &'a WarmClient) -> Self {
        Self { pool, warm }
    }

    /// Pre-closes any prior active session for `user_id`, then inserts the
    /// new one, as a single transaction — preserves "at most one active
    /// session per user" under concurrent `session:start` (spec §4.2).
    pub async fn start(&self, id: &str, user_id: &str, resort_id: Option<&str>, now: i64) -> Result<Session, AppError> {
        self.warm
            .with_timeout("sessions_start", async {
                let mut tx = self.pool.begin().await?;

                sqlx::query("UPDATE ski_sessions SET active = 0, end_time = ? WHERE user_id = ? AND active = 1")
                    .bind(now)
                    .bind(user_id)
                    .execute(&mut *tx)
                    .await?;

                sqlx::query(
                    "INSERT INTO ski_sessions (id, user_id, resort_id, start_time, end_time, active, \
                     total_vertical_meters, total_distance_meters, max_speed_mps) \
                     VALUES (?, ?, ?, ?, NULL, 1, 0, 0, 0)",
                )
                .bind(id)
                .bind(user_id)
                .bind(resort_id)
                .bind(now)
                .execute(&mut *tx)
                .await?;

                tx.commit().await?;

                Ok(Session {
                    id: id.to_string(),
                    user_id: user_id.to_string(),
                    resort_id: resort_id.map(str::to_string),
                    start_time: now,
                    end_time: None,
                    active: true,
                    total_vertical_meters: 0.0,
                    total_distance_meters: 0.0,
                    max_speed_mps: 0.0,
                })
            })
            .await
    }

    pub async fn get(&self, session_id: &str) -> Result<Option<Session>, AppError> {
        self.warm
            .with_timeout(
                "sessions_get",
                sqlx::query_as::<_, Session>("SELECT * FROM ski_sessions WHERE id = ?").bind(session_id).fetch_optional(self.pool),
            )
            .await
    }

    /// Marks `session_id` inactive with `end_time = now`, verifying it is
    /// owned by `user_id` and still active. Returns the row as it was
    /// *before* the update so the caller can compute `durationSeconds`.
    pub async fn end(&self, session_id: &str, user_id: &str, now: i64) -> Result<Option<Session>, AppError> {
        self.warm
            .with_timeout("sessions_end", async {
                let mut tx = self.pool.begin().await?;

                let existing = sqlx::query_as::<_, Session>(
                    "SELECT * FROM ski_sessions WHERE id = ? AND user_id = ? AND active = 1",
                )
                .bind(session_id)
                .bind(user_id)
                .fetch_optional(&mut *tx)
                .await?;

                let Some(existing) = existing else {
                    tx.commit().await?;
                    return Ok(None);
                };

                sqlx::query("UPDATE ski_sessions SET active = 0, end_time = ? WHERE id = ?")
                    .bind(now)
                    .bind(session_id)
                    .execute(&mut *tx)
                    .await?;

                tx.commit().await?;
                Ok(Some(Session { end_time: Some(now), active: false, ..existing }))
            })
            .await
    }

    /// Additive update of the running aggregates (spec §4.3 step 3).
    pub async fn apply_aggregates(
        &self,
        session_id: &str,
        additional_distance: f64,
        additional_vertical: f64,
        max_speed_candidate: f64,
    ) -> Result<(), AppError> {
        self.warm
            .with_timeout(
                "sessions_apply_aggregates",
                sqlx::query(
                    "UPDATE ski_sessions SET \
                     total_distance_meters = total_distance_meters + ?, \
                     total_vertical_meters = total_vertical_meters + ?, \
                     max_speed_mps = MAX(max_speed_mps, ?) \
                     WHERE id = ?",
                )
                .bind(additional_distance)
                .bind(additional_vertical)
                .bind(max_speed_candidate)
                .bind(session_id)
                .execute(self.pool),
            )
            .await?;
        Ok(())
    }
}
