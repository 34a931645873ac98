//! Frame demultiplexing (spec §4.1): parses one inbound frame and routes it
//! to LocationEngine or ChatEngine, delivering the ack (if any) back to the
//! same connection.

use crate::state::Core;
use ski_proto::{ClientEvent, InboundFrame, OutboundFrame};
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("malformed frame: {0}")]
    Malformed(String),
    #[error("local connection gone")]
    ConnectionGone,
}

/// Handle one raw text frame: decode, dispatch, ack. Unknown/malformed
/// frames fail closed with no side effects (spec §4.1) and are logged,
/// never propagated as a connection-closing error.
pub async fn handle_frame(core: &Core, handle: &str, user_id: &str, raw: &str) -> Result<(), DispatchError> {
    let inbound: InboundFrame = match serde_json::from_str(raw) {
        Ok(frame) => frame,
        Err(e) => {
            debug!(%user_id, error = %e, "Gateway: malformed frame envelope");
            return Ok(());
        }
    };

    let event_name = inbound.event.clone();
    let event = match ClientEvent::try_from(inbound) {
        Ok(event) => event,
        Err(e) => {
            debug!(%user_id, %event_name, error = %e, "Gateway: unrecognized or malformed event");
            return Ok(());
        }
    };

    let Some(ack) = route(core, handle, user_id, event).await else {
        return Ok(());
    };

    let frame = OutboundFrame { event: event_name, data: ack };
    core.registry.deliver_to_handle(handle, frame).await;
    Ok(())
}

/// Dispatches one decoded event and returns its ack payload, or `None` for
/// the sole fire-and-forget event (`chat:typing`).
async fn route(core: &Core, handle: &str, user_id: &str, event: ClientEvent) -> Option<serde_json::Value> {
    let value = match event {
        ClientEvent::SessionStart(payload) => {
            serde_json::to_value(core.location.session_start(user_id, payload.resort_id).await)
        }
        ClientEvent::SessionEnd(payload) => {
            serde_json::to_value(core.location.session_end(user_id, &payload.session_id).await)
        }
        ClientEvent::LocationPing(payload) => {
            serde_json::to_value(core.location.ping(handle, user_id, payload).await)
        }
        ClientEvent::LocationSubscribe(payload) => {
            serde_json::to_value(core.location.subscribe(user_id, payload.friend_ids).await)
        }
        ClientEvent::ChatJoin(payload) => {
            serde_json::to_value(core.chat.join(handle, user_id, &payload.target).await)
        }
        ClientEvent::ChatLeave(payload) => {
            serde_json::to_value(core.chat.leave(handle, user_id, &payload.room_id).await)
        }
        ClientEvent::ChatSend(payload) => serde_json::to_value(
            core.chat
                .send(user_id, &payload.target, &payload.content, payload.metadata.as_ref(), &core.jobs)
                .await,
        ),
        ClientEvent::ChatTyping(payload) => {
            core.chat.typing(handle, user_id, &payload.target, payload.is_typing).await;
            return None;
        }
        ClientEvent::ChatRead(payload) => {
            serde_json::to_value(core.chat.read(user_id, &payload.message_id, payload.group_id.as_deref()).await)
        }
        ClientEvent::ChatHistory(payload) => {
            serde_json::to_value(core.chat.history(user_id, &payload.target, payload.limit).await)
        }
    };

    value.ok()
}
