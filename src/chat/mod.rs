//! ChatEngine (spec §4.4): room resolution, access checks, HOT cache
//! write-through with WARM durability, and Backplane broadcast.

use crate::backplane::Backplane;
use crate::config::Tunables;
use crate::hot::{ChatCache, HotClient, Typing};
use crate::jobqueue::JobQueue;
use crate::metrics;
use crate::state::registry::ConnectionRegistry;
use crate::warm::WarmClient;
use chrono::Utc;
use ski_proto::{
    ChatReadNotice, ChatTypingNotice, HistoryAck, JoinAck, RoomTarget, SendAck, ServerEvent, SimpleAck,
};
use ski_proto::Room;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

pub const AFTER_WRITE_TOPIC: &str = "chat.after_write";

pub struct ChatEngine {
    hot: HotClient,
    warm: WarmClient,
    backplane: Arc<Backplane>,
    registry: Arc<ConnectionRegistry>,
    tunables: Tunables,
}

impl ChatEngine {
    pub fn new(
        hot: HotClient,
        warm: WarmClient,
        backplane: Arc<Backplane>,
        registry: Arc<ConnectionRegistry>,
        jobs: Arc<JobQueue>,
        tunables: Tunables,
    ) -> Arc<Self> {
        let engine = Arc::new(Self { hot, warm, backplane, registry, tunables });

        // Cross-cutting after-write work (push notifications, analytics).
        // A no-op handler in this deployment, registered so the topic has
        // somewhere to land (spec §4.4 step 4 "MAY be a no-op").
        jobs.register(
            AFTER_WRITE_TOPIC,
            Arc::new(|_payload: serde_json::Value| {
                Box::pin(async { Ok(()) }) as crate::jobqueue::HandlerFuture
            }),
        );

        engine
    }

    /// Resolve `target` to a canonical [`Room`], rejecting both-or-neither
    /// (spec §3 Message invariant: exactly one of groupId/recipientId).
    fn resolve_room(user_id: &str, target: &RoomTarget) -> Result<Room, ()> {
        match (&target.group_id, &target.recipient_id) {
            (Some(group_id), None) => Ok(Room::group(group_id.clone())),
            (None, Some(recipient_id)) => Ok(Room::dm(user_id, recipient_id)),
            _ => Err(()),
        }
    }

    async fn has_access(&self, user_id: &str, room: &Room) -> Result<bool, crate::error::AppError> {
        match room {
            Room::Group(group_id) => self.warm.groups().is_member(group_id, user_id).await,
            Room::Dm(a, b) => {
                let other = if a == user_id { b } else { a };
                self.warm.friendships().is_accepted(user_id, other).await
            }
        }
    }

    pub async fn join(&self, handle: &str, user_id: &str, target: &RoomTarget) -> JoinAck {
        let Ok(room) = Self::resolve_room(user_id, target) else {
            return JoinAck::fail();
        };
        match self.has_access(user_id, &room).await {
            Ok(true) => {
                self.registry.join_room(handle, &room.id());
                JoinAck::ok(room.id())
            }
            Ok(false) => JoinAck::fail(),
            Err(e) => {
                warn!(%user_id, error = %e, "chat:join failed");
                JoinAck::fail()
            }
        }
    }

    pub async fn leave(&self, handle: &str, user_id: &str, room_id: &str) -> SimpleAck {
        self.registry.leave_room(handle, room_id);

        if let Err(e) = Typing::clear(&self.hot, room_id, user_id).await {
            warn!(%user_id, %room_id, error = %e, "chat:leave: failed to clear typing flag");
        }
        let notice = ServerEvent::ChatTyping(ChatTypingNotice {
            room_id: room_id.to_string(),
            user_id: user_id.to_string(),
            is_typing: false,
        })
        .into_frame();
        if let Err(e) = self.backplane.publish(&format!("room:{room_id}"), &notice).await {
            warn!(%room_id, error = %e, "chat:leave: failed to publish typing-stopped notice");
        }

        SimpleAck::ok()
    }

    /// `chat:send` (spec §4.4, authoritative algorithm).
    pub async fn send(
        &self,
        user_id: &str,
        target: &RoomTarget,
        content: &str,
        metadata: Option<&ski_proto::MessageMetadata>,
        jobs: &JobQueue,
    ) -> SendAck {
        let Ok(room) = Self::resolve_room(user_id, target) else {
            return SendAck::fail();
        };
        match self.has_access(user_id, &room).await {
            Ok(true) => {}
            Ok(false) => return SendAck::fail(),
            Err(e) => {
                warn!(%user_id, error = %e, "chat:send: access check failed");
                return SendAck::fail();
            }
        }

        let id = Uuid::new_v4().to_string();
        let sent_at = Utc::now().timestamp_millis();
        let (group_id, recipient_id) = match &room {
            Room::Group(g) => (Some(g.as_str()), None),
            Room::Dm(a, b) => (None, Some(if a == user_id { b.as_str() } else { a.as_str() })),
        };

        let message = match self
            .warm
            .messages()
            .insert(&id, user_id, group_id, recipient_id, content, metadata, sent_at)
            .await
        {
            Ok(m) => m,
            Err(e) => {
                warn!(%user_id, error = %e, "chat:send: WARM insert failed");
                return SendAck::fail();
            }
        };

        let room_id = room.id();
        if let Err(e) = ChatCache::push(&self.hot, &room_id, &message, self.tunables.chat_cache_size, self.tunables.chat_cache_ttl_seconds).await {
            warn!(%room_id, error = %e, "chat:send: failed to write through HOT cache");
        }

        jobs.enqueue(AFTER_WRITE_TOPIC, serde_json::json!({"messageId": id, "roomId": room_id}));

        let frame = ServerEvent::ChatMessage(message.into_server_event()).into_frame();
        if let Err(e) = self.backplane.publish(&room.channel(), &frame).await {
            warn!(%room_id, error = %e, "chat:send: publish failed");
        }

        if let Err(e) = Typing::clear(&self.hot, &room_id, user_id).await {
            warn!(%user_id, %room_id, error = %e, "chat:send: failed to clear own typing flag");
        }

        metrics::CHAT_MESSAGES_SENT.inc();
        SendAck::ok(id, sent_at)
    }

    /// `chat:typing` — fire-and-forget, no ack (spec §4.4). Delivery goes
    /// through the same Backplane path as `chat:message`, which per spec
    /// §4.6 fans out to every local connection subscribed to the room;
    /// a sender who is itself joined to the room receives its own notice
    /// back like any other member (the Backplane primitive makes no
    /// per-recipient exception, and clients are expected to ignore typing
    /// notices whose userId is their own).
    pub async fn typing(&self, _handle: &str, user_id: &str, target: &RoomTarget, is_typing: bool) {
        let Ok(room) = Self::resolve_room(user_id, target) else { return };
        let room_id = room.id();

        let result = if is_typing {
            Typing::set(&self.hot, &room_id, user_id, self.tunables.typing_ttl_seconds).await
        } else {
            Typing::clear(&self.hot, &room_id, user_id).await
        };
        if let Err(e) = result {
            warn!(%user_id, %room_id, error = %e, "chat:typing: HOT write failed");
            return;
        }

        let notice = ServerEvent::ChatTyping(ChatTypingNotice {
            room_id: room_id.clone(),
            user_id: user_id.to_string(),
            is_typing,
        })
        .into_frame();
        if let Err(e) = self.backplane.publish(&room.channel(), &notice).await {
            warn!(%room_id, error = %e, "chat:typing: publish failed");
        }
    }

    /// `chat:read` — idempotent readBy append (spec invariant 9). The
    /// broadcast requires a roomId; the wire contract only carries a
    /// `groupId` hint (no `recipientId`), so a DM-room `chat:read` durably
    /// updates `readBy` but does not broadcast a `chat:read` notice.
    pub async fn read(&self, user_id: &str, message_id: &str, group_id: Option<&str>) -> SimpleAck {
        match self.warm.messages().mark_read(message_id, user_id).await {
            Ok(()) => {}
            Err(e @ crate::error::AppError::NotFound(_)) => {
                debug!(%user_id, %message_id, error = %e, "chat:read: unknown message");
                return SimpleAck::fail();
            }
            Err(e) => {
                warn!(%user_id, %message_id, error = %e, "chat:read failed");
                return SimpleAck::fail();
            }
        }

        if let Some(group_id) = group_id {
            let room = Room::group(group_id);
            let notice = ServerEvent::ChatRead(ChatReadNotice {
                message_id: message_id.to_string(),
                user_id: user_id.to_string(),
                read_at: Utc::now().timestamp_millis(),
            })
            .into_frame();
            if let Err(e) = self.backplane.publish(&room.channel(), &notice).await {
                warn!(room_id = %room.id(), error = %e, "chat:read: publish failed");
            }
        }

        SimpleAck::ok()
    }

    /// `chat:history` (spec §4.4, authoritative algorithm).
    pub async fn history(&self, user_id: &str, target: &RoomTarget, limit: Option<u32>) -> HistoryAck {
        let Ok(room) = Self::resolve_room(user_id, target) else {
            return HistoryAck::fail();
        };
        match self.has_access(user_id, &room).await {
            Ok(true) => {}
            Ok(false) => return HistoryAck::fail(),
            Err(e) => {
                warn!(%user_id, error = %e, "chat:history: access check failed");
                return HistoryAck::fail();
            }
        }

        let limit = limit.unwrap_or(50).min(100) as usize;
        let room_id = room.id();

        match ChatCache::read(&self.hot, &room_id, limit, self.tunables.chat_cache_ttl_seconds).await {
            Ok(messages) if !messages.is_empty() => {
                return HistoryAck::ok(messages.into_iter().map(|m| m.into_server_event()).collect());
            }
            Ok(_) => {}
            Err(e) => warn!(%room_id, error = %e, "chat:history: HOT read failed, falling through to WARM"),
        }

        let warm_messages = match self.warm.messages().history(&room, limit as i64).await {
            Ok(m) => m,
            Err(e) => {
                warn!(%room_id, error = %e, "chat:history: WARM read failed");
                return HistoryAck::fail();
            }
        };

        // WARM returns newest-first; refill expects oldest-first so the
        // cache ends up head = newest after the pushes (spec §4.4 step 3).
        let mut chronological = warm_messages.clone();
        chronological.reverse();
        if let Err(e) = ChatCache::refill(&self.hot, &room_id, &chronological, self.tunables.chat_cache_size, self.tunables.chat_cache_ttl_seconds).await {
            warn!(%room_id, error = %e, "chat:history: cache refill failed");
        } else {
            metrics::CHAT_CACHE_REFILLS.inc();
        }

        HistoryAck::ok(chronological.into_iter().map(|m| m.into_server_event()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(group_id: Option<&str>, recipient_id: Option<&str>) -> RoomTarget {
        RoomTarget { group_id: group_id.map(str::to_string), recipient_id: recipient_id.map(str::to_string) }
    }

    #[test]
    fn group_target_resolves_to_a_group_room() {
        let room = ChatEngine::resolve_room("u1", &target(Some("g1"), None)).unwrap();
        assert_eq!(room, Room::group("g1"));
    }

    #[test]
    fn recipient_target_resolves_to_a_canonical_dm_room() {
        let room = ChatEngine::resolve_room("alice", &target(None, Some("bob"))).unwrap();
        assert_eq!(room, Room::dm("alice", "bob"));
    }

    #[test]
    fn neither_group_nor_recipient_is_rejected() {
        assert!(ChatEngine::resolve_room("u1", &target(None, None)).is_err());
    }

    #[test]
    fn both_group_and_recipient_is_rejected() {
        assert!(ChatEngine::resolve_room("u1", &target(Some("g1"), Some("bob"))).is_err());
    }
}
