//! PingPersister (spec §4.3): drains the `location.ping` job topic,
//! batches writes, and maintains per-session derived aggregates.

use super::geo::haversine_distance_meters;
use crate::config::Tunables;
use crate::error::AppError;
use crate::jobqueue::JobQueue;
use crate::metrics;
use crate::model::Ping;
use crate::warm::WarmClient;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

pub const TOPIC: &str = "location.ping";

pub struct PingPersister {
    warm: WarmClient,
    buffer: Mutex<Vec<Ping>>,
    batch_size: usize,
}

impl PingPersister {
    pub fn start(warm: WarmClient, jobs: Arc<JobQueue>, tunables: Tunables) -> Arc<Self> {
        let persister = Arc::new(Self { warm, buffer: Mutex::new(Vec::new()), batch_size: tunables.batch_size });

        let handler_target = persister.clone();
        jobs.register(
            TOPIC,
            Arc::new(move |payload: Value| {
                let target = handler_target.clone();
                Box::pin(async move { target.accept(payload).await })
            }),
        );

        tokio::spawn(run_flush_timer(persister.clone(), Duration::from_millis(tunables.batch_flush_ms)));
        persister
    }

    async fn accept(&self, payload: Value) -> Result<(), AppError> {
        let ping: Ping = serde_json::from_value(payload).map_err(|e| AppError::Validation(e.to_string()))?;
        let should_flush = {
            let mut buffer = self.buffer.lock();
            buffer.push(ping);
            buffer.len() >= self.batch_size
        };
        if should_flush {
            self.flush().await;
        }
        Ok(())
    }

    /// Detach up to `batch_size` buffered entries and flush them. On
    /// failure the batch is returned to the head of the buffer for retry
    /// (spec §4.3 "Batching policy").
    pub async fn flush(&self) {
        let batch = {
            let mut buffer = self.buffer.lock();
            if buffer.is_empty() {
                return;
            }
            let take = self.batch_size.min(buffer.len());
            buffer.drain(..take).collect::<Vec<_>>()
        };

        if let Err(e) = self.flush_batch(&batch).await {
            warn!(error = %e, batch_len = batch.len(), "PingPersister: flush failed, returning batch to buffer");
            metrics::BATCH_FLUSHES.with_label_values(&["failure"]).inc();
            let mut buffer = self.buffer.lock();
            let mut restored = batch;
            restored.append(&mut buffer);
            *buffer = restored;
        } else {
            metrics::BATCH_FLUSHES.with_label_values(&["success"]).inc();
        }
    }

    async fn flush_batch(&self, batch: &[Ping]) -> Result<(), AppError> {
        self.warm.pings().insert_batch(batch).await?;

        let mut by_session: HashMap<&str, Vec<&Ping>> = HashMap::new();
        for ping in batch {
            by_session.entry(ping.session_id.as_str()).or_default().push(ping);
        }

        for (session_id, mut pings) in by_session {
            pings.sort_by_key(|p| p.captured_at);

            let mut additional_distance = 0.0;
            let mut vertical_descent = 0.0;
            for pair in pings.windows(2) {
                let (prev, curr) = (pair[0], pair[1]);
                additional_distance += haversine_distance_meters(prev.lat, prev.lon, curr.lat, curr.lon);
                let drop = prev.altitude_meters - curr.altitude_meters;
                if drop > 0.0 {
                    vertical_descent += drop;
                }
            }
            let max_speed = pings.iter().map(|p| p.speed_mps).fold(0.0_f64, f64::max);

            self.warm.sessions().apply_aggregates(session_id, additional_distance, vertical_descent, max_speed).await?;
        }

        Ok(())
    }
}

async fn run_flush_timer(persister: Arc<PingPersister>, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        ticker.tick().await;
        persister.flush().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ping(session_id: &str, lat: f64, lon: f64, altitude: f64, speed: f64, t: i64) -> Ping {
        Ping {
            session_id: session_id.to_string(),
            user_id: "u1".to_string(),
            lon,
            lat,
            altitude_meters: altitude,
            speed_mps: speed,
            accuracy_meters: 5.0,
            heading_degrees: None,
            captured_at: t,
        }
    }

    #[test]
    fn batch_aggregate_math_matches_spec_scenario_s5() {
        // S5: three pings, altitudes [3000, 2990, 2985], ~100m apart in
        // succession. additionalDistance ~= 200m, verticalDescent = 15m.
        let batch = vec![
            ping("s1", 39.6042, -105.9538, 3000.0, 4.0, 0),
            ping("s1", 39.60510, -105.9538, 2990.0, 5.0, 1000),
            ping("s1", 39.60600, -105.9538, 2985.0, 3.0, 2000),
        ];

        let mut pings: Vec<&Ping> = batch.iter().collect();
        pings.sort_by_key(|p| p.captured_at);

        let mut additional_distance = 0.0;
        let mut vertical_descent = 0.0;
        for pair in pings.windows(2) {
            additional_distance += haversine_distance_meters(pair[0].lat, pair[0].lon, pair[1].lat, pair[1].lon);
            let drop = pair[0].altitude_meters - pair[1].altitude_meters;
            if drop > 0.0 {
                vertical_descent += drop;
            }
        }
        let max_speed = pings.iter().map(|p| p.speed_mps).fold(0.0_f64, f64::max);

        assert!((additional_distance - 200.0).abs() < 10.0, "got {additional_distance}");
        assert!((vertical_descent - 15.0).abs() < 1e-9);
        assert_eq!(max_speed, 5.0);
    }
}
