//! Inbound (client → server) events, parsed from [`InboundFrame`]s.

use crate::envelope::{InboundFrame, ProtoError};
use crate::message::MessageMetadata;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStart {
    pub resort_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionEnd {
    pub session_id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationPing {
    pub session_id: String,
    pub lat: f64,
    pub lon: f64,
    pub altitude: f64,
    pub speed: f64,
    pub accuracy: f64,
    #[serde(default)]
    pub heading: Option<f64>,
    pub timestamp: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationSubscribe {
    #[serde(default)]
    pub friend_ids: Vec<String>,
}

/// Either a group id or a recipient id identifies the room for a chat
/// operation; parsing doesn't enforce exactly-one here (that invariant is
/// checked by the engine, which must reject both-or-neither explicitly so
/// the failure is attributable rather than silently defaulting).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RoomTarget {
    #[serde(default)]
    pub group_id: Option<String>,
    #[serde(default)]
    pub recipient_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatJoin {
    #[serde(flatten)]
    pub target: RoomTarget,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatLeave {
    pub room_id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSend {
    #[serde(flatten)]
    pub target: RoomTarget,
    pub content: String,
    #[serde(default)]
    pub metadata: Option<MessageMetadata>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatTyping {
    #[serde(flatten)]
    pub target: RoomTarget,
    pub is_typing: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRead {
    pub message_id: String,
    #[serde(default)]
    pub group_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatHistory {
    #[serde(flatten)]
    pub target: RoomTarget,
    #[serde(default)]
    pub limit: Option<u32>,
}

#[derive(Debug, Clone)]
pub enum ClientEvent {
    SessionStart(SessionStart),
    SessionEnd(SessionEnd),
    LocationPing(LocationPing),
    LocationSubscribe(LocationSubscribe),
    ChatJoin(ChatJoin),
    ChatLeave(ChatLeave),
    ChatSend(ChatSend),
    ChatTyping(ChatTyping),
    ChatRead(ChatRead),
    ChatHistory(ChatHistory),
}

impl ClientEvent {
    /// Whether this event namespace is location or chat — used by the
    /// Gateway to demultiplex without matching on every variant twice.
    pub fn namespace(&self) -> &'static str {
        match self {
            ClientEvent::SessionStart(_)
            | ClientEvent::SessionEnd(_)
            | ClientEvent::LocationPing(_)
            | ClientEvent::LocationSubscribe(_) => "location",
            ClientEvent::ChatJoin(_)
            | ClientEvent::ChatLeave(_)
            | ClientEvent::ChatSend(_)
            | ClientEvent::ChatTyping(_)
            | ClientEvent::ChatRead(_)
            | ClientEvent::ChatHistory(_) => "chat",
        }
    }

    /// `chat:typing` is the sole fire-and-forget event in the contract —
    /// every other event returns a synchronous ack.
    pub fn expects_ack(&self) -> bool {
        !matches!(self, ClientEvent::ChatTyping(_))
    }
}

macro_rules! parse_variant {
    ($frame:expr, $variant:ident) => {{
        let payload = serde_json::from_value($frame.data).map_err(|source| ProtoError::Malformed {
            event: $frame.event.clone(),
            source,
        })?;
        Ok(ClientEvent::$variant(payload))
    }};
}

impl TryFrom<InboundFrame> for ClientEvent {
    type Error = ProtoError;

    fn try_from(frame: InboundFrame) -> Result<Self, Self::Error> {
        match frame.event.as_str() {
            "session:start" => parse_variant!(frame, SessionStart),
            "session:end" => parse_variant!(frame, SessionEnd),
            "location:ping" => parse_variant!(frame, LocationPing),
            "location:subscribe" => parse_variant!(frame, LocationSubscribe),
            "chat:join" => parse_variant!(frame, ChatJoin),
            "chat:leave" => parse_variant!(frame, ChatLeave),
            "chat:send" => parse_variant!(frame, ChatSend),
            "chat:typing" => parse_variant!(frame, ChatTyping),
            "chat:read" => parse_variant!(frame, ChatRead),
            "chat:history" => parse_variant!(frame, ChatHistory),
            other => Err(ProtoError::UnknownEvent(other.to_string())),
        }
    }
}
