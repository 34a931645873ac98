//! `location_pings` — append-only (spec §3 LocationPing, §4.3).

use super::WarmClient;
use crate::error::AppError;
use crate::model::Ping;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

pub struct PingRepository<'a> {
    pool: &'a SqlitePool,
    warm: &'a WarmClient,
}

impl<'a> PingRepository<'a> {
    pub(super) fn new(pool: &'a SqlitePool, warm: &'a WarmClient) -> Self {
        Self { pool, warm }
    }

    /// Inserts the whole batch as one multi-row statement (spec §4.3 step 2:
    /// "in one WARM call"). `batch` must be non-empty.
    pub async fn insert_batch(&self, batch: &[Ping]) -> Result<(), AppError> {
        if batch.is_empty() {
            return Ok(());
        }

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
            "INSERT INTO location_pings \
             (session_id, user_id, lon, lat, altitude_meters, speed_mps, accuracy_meters, heading_degrees, captured_at) ",
        );
        builder.push_values(batch, |mut row, ping| {
            row.push_bind(&ping.session_id)
                .push_bind(&ping.user_id)
                .push_bind(ping.lon)
                .push_bind(ping.lat)
                .push_bind(ping.altitude_meters)
                .push_bind(ping.speed_mps)
                .push_bind(ping.accuracy_meters)
                .push_bind(ping.heading_degrees)
                .push_bind(ping.captured_at);
        });

        self.warm.with_timeout("pings_insert_batch", builder.build().execute(self.pool)).await?;
        Ok(())
    }
}
