//! Wire protocol for the realtime ski-tracking core.
//!
//! The transport is framed JSON of the shape `{"event": string, "data":
//! object}`. This crate owns the tagged-union mapping from that untyped
//! shape to strongly typed inbound/outbound event structures, plus the
//! canonical [`Room`] identity shared between access checks and channel
//! naming.

mod ack;
mod client_event;
mod envelope;
mod message;
mod room;
mod server_event;

pub use ack::{
    HistoryAck, JoinAck, PingAck, SendAck, SessionEndAck, SessionStartAck, SessionSummary,
    SimpleAck,
};
pub use client_event::{
    ChatHistory, ChatJoin, ChatLeave, ChatRead, ChatSend, ChatTyping, ClientEvent, LocationPing,
    LocationSubscribe, RoomTarget, SessionEnd, SessionStart,
};
pub use envelope::{InboundFrame, OutboundFrame, ProtoError};
pub use message::MessageMetadata;
pub use room::Room;
pub use server_event::{
    ChatMessage, ChatReadNotice, ChatTypingNotice, LocationProximity, LocationUpdate, ServerEvent,
};
