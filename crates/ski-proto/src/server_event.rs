//! Outbound (server → client) push events, delivered asynchronously —
//! distinct from the synchronous ack envelopes in [`crate::ack`].

use crate::envelope::OutboundFrame;
use crate::message::MessageMetadata;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationUpdate {
    pub user_id: String,
    pub lat: f64,
    pub lon: f64,
    pub speed: f64,
    pub heading: Option<f64>,
    pub timestamp: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationProximity {
    pub friend_id: String,
    pub friend_name: String,
    pub distance: f64,
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub sender_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient_id: Option<String>,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MessageMetadata>,
    pub sent_at: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatTypingNotice {
    pub room_id: String,
    pub user_id: String,
    pub is_typing: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatReadNotice {
    pub message_id: String,
    pub user_id: String,
    pub read_at: i64,
}

/// A server-pushed event, already bound to its wire event name.
#[derive(Debug, Clone)]
pub enum ServerEvent {
    LocationUpdate(LocationUpdate),
    LocationProximity(LocationProximity),
    ChatMessage(ChatMessage),
    ChatTyping(ChatTypingNotice),
    ChatRead(ChatReadNotice),
}

impl ServerEvent {
    pub fn into_frame(self) -> OutboundFrame {
        match self {
            ServerEvent::LocationUpdate(p) => OutboundFrame::new("location:update", p),
            ServerEvent::LocationProximity(p) => OutboundFrame::new("location:proximity", p),
            ServerEvent::ChatMessage(p) => OutboundFrame::new("chat:message", p),
            ServerEvent::ChatTyping(p) => OutboundFrame::new("chat:typing", p),
            ServerEvent::ChatRead(p) => OutboundFrame::new("chat:read", p),
        }
    }
}
