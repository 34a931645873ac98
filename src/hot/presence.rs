//! Presence: the geo-index member + location hash pair from spec §3, both
//! refreshed together on every accepted ping and both expired on the same
//! sliding TTL.

use super::HotClient;
use crate::error::AppError;
use crate::model::Ping;
use redis::AsyncCommands;
use redis::geo::{RadiusOptions, RadiusSearchResult, Unit};
use std::collections::HashMap;

const GEO_KEY: &str = "geo:users";

fn location_key(user_id: &str) -> String {
    format!("location:{user_id}")
}

pub struct Presence;

impl Presence {
    /// `GEOADD geo:users lon lat userId`; `HSET location:{userId}`;
    /// `EXPIRE` both to the sliding TTL.
    pub async fn refresh(hot: &HotClient, ping: &Ping, ttl_seconds: u64) -> Result<(), AppError> {
        let mut conn = hot.conn();
        hot.with_timeout("presence_geo_add", conn.geo_add(GEO_KEY, (ping.lon, ping.lat, ping.user_id.as_str())))
            .await?;

        let key = location_key(&ping.user_id);
        let encoded = encode(ping);
        hot.with_timeout("presence_hset", conn.hset_multiple::<_, _, _, ()>(&key, &encoded)).await?;
        hot.with_timeout("presence_expire", conn.expire::<_, ()>(GEO_KEY, ttl_seconds as i64)).await?;
        hot.with_timeout("presence_expire", conn.expire::<_, ()>(&key, ttl_seconds as i64)).await?;
        Ok(())
    }

    /// Remove both the geo member and the hash — used on `session:end` and
    /// on full user disconnect. Never fails hard on a missing member.
    pub async fn clear(hot: &HotClient, user_id: &str) -> Result<(), AppError> {
        let mut conn = hot.conn();
        hot.with_timeout("presence_zrem", conn.zrem::<_, _, ()>(GEO_KEY, user_id)).await?;
        hot.with_timeout("presence_del", conn.del::<_, ()>(location_key(user_id))).await?;
        Ok(())
    }

    pub async fn get(hot: &HotClient, user_id: &str) -> Result<Option<Ping>, AppError> {
        let mut conn = hot.conn();
        let map: HashMap<String, String> =
            hot.with_timeout("presence_hgetall", conn.hgetall(location_key(user_id))).await?;
        if map.is_empty() {
            return Ok(None);
        }
        Ok(decode(&map))
    }

    /// Radius query centered at `(lon, lat)`, ordered by distance
    /// ascending with ties broken by member id ascending (spec §4.2).
    pub async fn radius(
        hot: &HotClient,
        lon: f64,
        lat: f64,
        radius_meters: f64,
    ) -> Result<Vec<GeoHit>, AppError> {
        let mut conn = hot.conn();
        let options = RadiusOptions::default().with_coord().with_dist();
        let raw: Vec<RadiusSearchResult> = hot
            .with_timeout("presence_geo_radius", conn.geo_radius(GEO_KEY, lon, lat, radius_meters, Unit::Meters, options))
            .await?;

        let mut hits: Vec<GeoHit> = raw
            .into_iter()
            .filter_map(|r| {
                let coord = r.coord?;
                let dist = r.dist?;
                Some(GeoHit { member: r.name, distance_meters: dist, lon: coord.longitude, lat: coord.latitude })
            })
            .collect();

        hits.sort_by(|a, b| {
            a.distance_meters
                .partial_cmp(&b.distance_meters)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.member.cmp(&b.member))
        });
        Ok(hits)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeoHit {
    pub member: String,
    pub distance_meters: f64,
    pub lon: f64,
    pub lat: f64,
}

fn encode(ping: &Ping) -> Vec<(&'static str, String)> {
    vec![
        ("sessionId", ping.session_id.clone()),
        ("userId", ping.user_id.clone()),
        ("lon", ping.lon.to_string()),
        ("lat", ping.lat.to_string()),
        ("altitudeMeters", ping.altitude_meters.to_string()),
        ("speedMps", ping.speed_mps.to_string()),
        ("accuracyMeters", ping.accuracy_meters.to_string()),
        ("headingDegrees", ping.heading_degrees.map(|h| h.to_string()).unwrap_or_default()),
        ("capturedAt", ping.captured_at.to_string()),
    ]
}

fn decode(map: &HashMap<String, String>) -> Option<Ping> {
    Some(Ping {
        session_id: map.get("sessionId")?.clone(),
        user_id: map.get("userId")?.clone(),
        lon: map.get("lon")?.parse().ok()?,
        lat: map.get("lat")?.parse().ok()?,
        altitude_meters: map.get("altitudeMeters")?.parse().ok()?,
        speed_mps: map.get("speedMps")?.parse().ok()?,
        accuracy_meters: map.get("accuracyMeters")?.parse().ok()?,
        heading_degrees: map.get("headingDegrees").and_then(|s| s.parse().ok()),
        captured_at: map.get("capturedAt")?.parse().ok()?,
    })
}
