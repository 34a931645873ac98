//! Shared domain types (spec §3), independent of whether they're read from
//! HOT or WARM. Storage-specific shapes (sqlx `FromRow`, HOT hash encoding)
//! live next to their repositories in [`crate::warm`] and [`crate::hot`].

use serde::{Deserialize, Serialize};
use ski_proto::MessageMetadata;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Session {
    pub id: String,
    pub user_id: String,
    pub resort_id: Option<String>,
    pub start_time: i64,
    pub end_time: Option<i64>,
    pub active: bool,
    pub total_vertical_meters: f64,
    pub total_distance_meters: f64,
    pub max_speed_mps: f64,
}

/// A single GPS sample. Used both for the WARM `location_pings` row shape
/// and the HOT presence hash payload — the two representations share this
/// one struct since they carry the same fields (spec §3 Presence note
/// (a)/(b) are refreshed from the same accepted ping).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ping {
    pub session_id: String,
    pub user_id: String,
    pub lon: f64,
    pub lat: f64,
    pub altitude_meters: f64,
    pub speed_mps: f64,
    pub accuracy_meters: f64,
    pub heading_degrees: Option<f64>,
    pub captured_at: i64,
}

impl Ping {
    /// Validate the invariants from spec §3: lat/lon ranges, non-negative
    /// speed/accuracy, heading in [0, 360) when present.
    pub fn validate(&self) -> Result<(), String> {
        if !(-90.0..=90.0).contains(&self.lat) {
            return Err(format!("lat {} out of range", self.lat));
        }
        if !(-180.0..=180.0).contains(&self.lon) {
            return Err(format!("lon {} out of range", self.lon));
        }
        if self.speed_mps < 0.0 {
            return Err("speed must be >= 0".to_string());
        }
        if self.accuracy_meters < 0.0 {
            return Err("accuracy must be >= 0".to_string());
        }
        if let Some(heading) = self.heading_degrees {
            if !(0.0..360.0).contains(&heading) {
                return Err(format!("heading {heading} out of range"));
            }
        }
        if self.session_id.trim().is_empty() {
            return Err("sessionId must not be empty".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub sender_id: String,
    pub group_id: Option<String>,
    pub recipient_id: Option<String>,
    pub content: String,
    pub metadata: Option<MessageMetadata>,
    pub read_by: Vec<String>,
    pub sent_at: i64,
}

impl Message {
    pub fn into_server_event(self) -> ski_proto::ChatMessage {
        ski_proto::ChatMessage {
            id: self.id,
            sender_id: self.sender_id,
            group_id: self.group_id,
            recipient_id: self.recipient_id,
            content: self.content,
            metadata: self.metadata,
            sent_at: self.sent_at,
        }
    }
}

/// A nearby accepted friend returned by the geo radius query, per spec
/// §4.2 `NearbyFriends`.
#[derive(Debug, Clone, PartialEq)]
pub struct NearbyFriend {
    pub friend_id: String,
    pub friend_name: String,
    pub distance_meters: f64,
    pub lon: f64,
    pub lat: f64,
}
