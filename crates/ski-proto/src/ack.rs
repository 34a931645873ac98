//! Synchronous acknowledgement envelopes returned for every client event
//! except `chat:typing` (see [`crate::client_event::ClientEvent::expects_ack`]).
//!
//! Every handler converts its outcome into one of these — never an
//! exception that crosses the Gateway boundary.

use crate::server_event::ChatMessage;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStartAck {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<i64>,
}

impl SessionStartAck {
    pub fn ok(session_id: String, start_time: i64) -> Self {
        Self { success: true, session_id: Some(session_id), start_time: Some(start_time) }
    }
    pub fn fail() -> Self {
        Self { success: false, session_id: None, start_time: None }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub total_vertical: f64,
    pub total_distance: f64,
    pub max_speed: f64,
    pub duration_seconds: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionEndAck {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<SessionSummary>,
}

impl SessionEndAck {
    pub fn ok(summary: SessionSummary) -> Self {
        Self { success: true, summary: Some(summary) }
    }
    pub fn fail() -> Self {
        Self { success: false, summary: None }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PingAck {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub throttled: Option<bool>,
}

impl PingAck {
    pub fn ok() -> Self {
        Self { success: true, throttled: None }
    }
    pub fn throttled() -> Self {
        Self { success: false, throttled: Some(true) }
    }
    pub fn fail() -> Self {
        Self { success: false, throttled: None }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SimpleAck {
    pub success: bool,
}

impl SimpleAck {
    pub fn ok() -> Self {
        Self { success: true }
    }
    pub fn fail() -> Self {
        Self { success: false }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinAck {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_id: Option<String>,
}

impl JoinAck {
    pub fn ok(room_id: String) -> Self {
        Self { success: true, room_id: Some(room_id) }
    }
    pub fn fail() -> Self {
        Self { success: false, room_id: None }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendAck {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sent_at: Option<i64>,
}

impl SendAck {
    pub fn ok(message_id: String, sent_at: i64) -> Self {
        Self { success: true, message_id: Some(message_id), sent_at: Some(sent_at) }
    }
    pub fn fail() -> Self {
        Self { success: false, message_id: None, sent_at: None }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryAck {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub messages: Option<Vec<ChatMessage>>,
}

impl HistoryAck {
    pub fn ok(messages: Vec<ChatMessage>) -> Self {
        Self { success: true, messages: Some(messages) }
    }
    pub fn fail() -> Self {
        Self { success: false, messages: None }
    }
}
