//! Chat message content and its optional typed metadata variant.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageMetadata {
    Text,
    Image { url: String },
    Location { lat: f64, lon: f64 },
    #[serde(rename = "meetup-request")]
    MeetupRequest { id: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meetup_request_tag_matches_the_wire_contract() {
        let value = serde_json::to_value(MessageMetadata::MeetupRequest { id: "evt-1".into() }).unwrap();
        assert_eq!(value["type"], "meetup-request");
    }

    #[test]
    fn meetup_request_tag_round_trips() {
        let json = serde_json::json!({"type": "meetup-request", "id": "evt-1"});
        let parsed: MessageMetadata = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, MessageMetadata::MeetupRequest { id: "evt-1".into() });
    }
}
