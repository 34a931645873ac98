//! The wire-level frame shape: `{"event": "...", "data": {...}}`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A raw inbound frame before it has been matched against a known event
/// name. Unknown event names are a validation failure that the caller
/// fails closed on, with no side effects.
#[derive(Debug, Clone, Deserialize)]
pub struct InboundFrame {
    pub event: String,
    #[serde(default)]
    pub data: Value,
}

/// A raw outbound frame, produced by serializing a typed server event.
///
/// `event` is an owned `String` (rather than `&'static str`) so a frame can
/// round-trip through the Backplane's pub/sub transport, which carries it
/// as serialized JSON between nodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboundFrame {
    pub event: String,
    pub data: Value,
}

impl OutboundFrame {
    pub fn new(event: &'static str, data: impl Serialize) -> Self {
        Self {
            event: event.to_string(),
            data: serde_json::to_value(data).unwrap_or(Value::Null),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProtoError {
    #[error("unknown event: {0}")]
    UnknownEvent(String),
    #[error("malformed payload for {event}: {source}")]
    Malformed {
        event: String,
        #[source]
        source: serde_json::Error,
    },
}
