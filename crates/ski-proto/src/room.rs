//! Canonical room identity.
//!
//! A `Room` is never stored; it is derived deterministically from either a
//! group id or a pair of user ids so that access checks and pub/sub channel
//! names can never disagree about which room a message belongs to.

use std::fmt;

/// A chat room identity: either a group chat or a direct message between
/// two users.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Room {
    Group(String),
    /// Canonically ordered so `Dm(a, b)` and `Dm(b, a)` are never both
    /// constructed — use [`Room::dm`] rather than this variant directly.
    Dm(String, String),
}

impl Room {
    /// Build a DM room id from two user ids, canonicalizing their order.
    pub fn dm(a: &str, b: &str) -> Self {
        if a <= b {
            Room::Dm(a.to_string(), b.to_string())
        } else {
            Room::Dm(b.to_string(), a.to_string())
        }
    }

    pub fn group(id: impl Into<String>) -> Self {
        Room::Group(id.into())
    }

    /// The channel/room id string, e.g. `group:abc` or `dm:a_b`.
    pub fn id(&self) -> String {
        match self {
            Room::Group(id) => format!("group:{id}"),
            Room::Dm(a, b) => format!("dm:{a}_{b}"),
        }
    }

    /// Parse a canonical room id string back into a `Room`.
    pub fn parse(id: &str) -> Option<Self> {
        if let Some(rest) = id.strip_prefix("group:") {
            return Some(Room::Group(rest.to_string()));
        }
        if let Some(rest) = id.strip_prefix("dm:") {
            let (a, b) = rest.split_once('_')?;
            return Some(Room::Dm(a.to_string(), b.to_string()));
        }
        None
    }

    /// HOT pub/sub channel name for this room.
    pub fn channel(&self) -> String {
        format!("room:{}", self.id())
    }
}

impl fmt::Display for Room {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}
