//! LocationEngine (spec §4.2): session lifecycle, ping ingestion with
//! throttle/validation, hot presence, and friend-proximity fan-out.

mod geo;
mod persister;

use crate::backplane::Backplane;
use crate::config::Tunables;
use crate::hot::{HotClient, Presence, Subscribe};
use crate::jobqueue::JobQueue;
use crate::metrics;
use crate::model::{NearbyFriend, Ping};
use crate::state::registry::ConnectionRegistry;
use crate::warm::WarmClient;
use dashmap::DashMap;
use ski_proto::{LocationProximity, LocationUpdate, PingAck, ServerEvent, SessionEndAck, SessionStartAck, SessionSummary, SimpleAck};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

pub struct LocationEngine {
    hot: HotClient,
    warm: WarmClient,
    backplane: Arc<Backplane>,
    registry: Arc<ConnectionRegistry>,
    jobs: Arc<JobQueue>,
    tunables: Tunables,
    last_ping: DashMap<String, i64>,
    persister: Arc<persister::PingPersister>,
}

impl LocationEngine {
    pub fn new(
        hot: HotClient,
        warm: WarmClient,
        backplane: Arc<Backplane>,
        registry: Arc<ConnectionRegistry>,
        jobs: Arc<JobQueue>,
        tunables: Tunables,
    ) -> Arc<Self> {
        let persister = persister::PingPersister::start(warm.clone(), jobs.clone(), tunables.clone());
        Arc::new(Self { hot, warm, backplane, registry, jobs, tunables, last_ping: DashMap::new(), persister })
    }

    /// Force-drains the persister's buffer — used on graceful shutdown.
    pub async fn flush_pending_pings(&self) {
        self.persister.flush().await;
    }

    pub async fn session_start(&self, user_id: &str, resort_id: Option<String>) -> SessionStartAck {
        debug!(%user_id, "session:start");
        let id = Uuid::new_v4().to_string();
        let now = now_millis();
        match self.warm.sessions().start(&id, user_id, resort_id.as_deref(), now).await {
            Ok(session) => {
                metrics::ACTIVE_SESSIONS.inc();
                SessionStartAck::ok(session.id, session.start_time)
            }
            Err(e) => {
                warn!(%user_id, error = %e, "session:start failed");
                SessionStartAck::fail()
            }
        }
    }

    pub async fn session_end(&self, user_id: &str, session_id: &str) -> SessionEndAck {
        debug!(%user_id, %session_id, "session:end");
        let now = now_millis();
        match self.warm.sessions().end(session_id, user_id, now).await {
            Ok(Some(session)) => {
                let duration_seconds = (now - session.start_time) / 1000;
                if let Err(e) = Presence::clear(&self.hot, user_id).await {
                    warn!(%user_id, error = %e, "session:end: failed to clear hot presence");
                }
                metrics::ACTIVE_SESSIONS.dec();
                SessionEndAck::ok(SessionSummary {
                    total_vertical: session.total_vertical_meters,
                    total_distance: session.total_distance_meters,
                    max_speed: session.max_speed_mps,
                    duration_seconds,
                })
            }
            Ok(None) => SessionEndAck::fail(),
            Err(e) => {
                warn!(%user_id, error = %e, "session:end failed");
                SessionEndAck::fail()
            }
        }
    }

    /// `location:ping` (spec §4.2, authoritative algorithm). `handle` is
    /// the connection the ping arrived on, used both for throttle state
    /// and to address the proximity alert back to the pinger.
    pub async fn ping(&self, handle: &str, user_id: &str, payload: ski_proto::LocationPing) -> PingAck {
        let now = now_millis();
        if let Some(last) = self.last_ping.get(handle) {
            if now - *last < self.tunables.ping_throttle_ms as i64 {
                metrics::PINGS_THROTTLED.inc();
                return PingAck::throttled();
            }
        }
        self.last_ping.insert(handle.to_string(), now);

        let ping = Ping {
            session_id: payload.session_id,
            user_id: user_id.to_string(),
            lon: payload.lon,
            lat: payload.lat,
            altitude_meters: payload.altitude,
            speed_mps: payload.speed,
            accuracy_meters: payload.accuracy,
            heading_degrees: payload.heading,
            captured_at: payload.timestamp,
        };

        if let Err(e) = ping.validate() {
            metrics::PINGS_REJECTED.with_label_values(&["validation"]).inc();
            debug!(%user_id, error = %e, "location:ping rejected");
            return PingAck::fail();
        }

        if let Err(e) = Presence::refresh(&self.hot, &ping, self.tunables.presence_ttl_seconds).await {
            metrics::PINGS_REJECTED.with_label_values(&["hot_error"]).inc();
            warn!(%user_id, error = %e, "location:ping: hot refresh failed");
            return PingAck::fail();
        }
        metrics::PINGS_ACCEPTED.inc();

        match serde_json::to_value(&ping) {
            Ok(value) => self.jobs.enqueue(persister::TOPIC, value),
            Err(e) => warn!(%user_id, error = %e, "location:ping: failed to serialize persistence job"),
        }

        if let Err(e) = self.fan_out(handle, &ping).await {
            warn!(%user_id, error = %e, "location:ping: fan-out failed");
        }

        PingAck::ok()
    }

    /// Records declared interest; the authoritative fan-out gate stays
    /// friendship (SPEC_FULL.md §9 Open Question 1).
    pub async fn subscribe(&self, user_id: &str, friend_ids: Vec<String>) -> SimpleAck {
        match Subscribe::set(&self.hot, user_id, &friend_ids).await {
            Ok(()) => SimpleAck::ok(),
            Err(e) => {
                warn!(%user_id, error = %e, "location:subscribe failed");
                SimpleAck::fail()
            }
        }
    }

    /// Clears hot presence for a user with no remaining connections
    /// anywhere in the fleet — called by the Gateway's disconnect
    /// accounting (spec §4.1), never on a mere session:end retry path.
    pub async fn clear_presence_if_disconnected(&self, user_id: &str) {
        if self.registry.count_for_user(user_id).await == 0 {
            if let Err(e) = Presence::clear(&self.hot, user_id).await {
                warn!(%user_id, error = %e, "failed to clear hot presence on disconnect");
            }
        }
    }

    async fn nearby_friends(&self, user_id: &str, lon: f64, lat: f64) -> Result<Vec<NearbyFriend>, crate::error::AppError> {
        let friend_ids = self.warm.friendships().accepted_friend_ids(user_id).await?;
        if friend_ids.is_empty() {
            return Ok(Vec::new());
        }
        let friend_set: HashSet<&str> = friend_ids.iter().map(String::as_str).collect();

        let hits = Presence::radius(&self.hot, lon, lat, self.tunables.proximity_radius_meters).await?;

        let mut results = Vec::new();
        for hit in hits {
            if hit.member == user_id || !friend_set.contains(hit.member.as_str()) {
                continue;
            }
            let Some(friend_name) = self.warm.users().display_name(&hit.member).await? else { continue };
            results.push(NearbyFriend {
                friend_id: hit.member,
                friend_name,
                distance_meters: hit.distance_meters,
                lon: hit.lon,
                lat: hit.lat,
            });
        }
        Ok(results)
    }

    /// Step 6 of the ping algorithm: deliver `location:update` to every
    /// nearby accepted friend, and a one-way `location:proximity` back to
    /// the pinger for friends within the 100 m threshold.
    async fn fan_out(&self, handle: &str, ping: &Ping) -> Result<(), crate::error::AppError> {
        let friends = self.nearby_friends(&ping.user_id, ping.lon, ping.lat).await?;

        for friend in friends {
            let update = ServerEvent::LocationUpdate(LocationUpdate {
                user_id: ping.user_id.clone(),
                lat: ping.lat,
                lon: ping.lon,
                speed: ping.speed_mps,
                heading: ping.heading_degrees,
                timestamp: ping.captured_at,
            })
            .into_frame();

            if let Err(e) = self.backplane.publish(&format!("user:{}", friend.friend_id), &update).await {
                warn!(friend_id = %friend.friend_id, error = %e, "location fan-out publish failed");
            } else {
                metrics::FANOUT_DELIVERED.with_label_values(&["location_update"]).inc();
            }

            if friend.distance_meters < 100.0 {
                let proximity = ServerEvent::LocationProximity(LocationProximity {
                    friend_id: friend.friend_id.clone(),
                    friend_name: friend.friend_name.clone(),
                    distance: friend.distance_meters,
                    lat: friend.lat,
                    lon: friend.lon,
                })
                .into_frame();
                self.registry.deliver_to_handle(handle, proximity).await;
                metrics::FANOUT_DELIVERED.with_label_values(&["proximity"]).inc();
            }
        }
        Ok(())
    }
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
