//! Gateway (spec §4.1): the single WebSocket endpoint. Authenticates once
//! at connect time, demultiplexes every subsequent frame to LocationEngine
//! or ChatEngine, and runs disconnect accounting when the socket closes.

mod dispatch;

use crate::state::Core;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use futures_util::{SinkExt, StreamExt};
use ski_proto::OutboundFrame;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

pub fn router(core: Arc<Core>) -> Router {
    Router::new().route("/ws", get(ws_handler)).with_state(core)
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    State(core): State<Arc<Core>>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let token = extract_token(&headers, &query);
    ws.on_upgrade(move |socket| handle_socket(socket, core, token))
}

/// Bearer token from the `Authorization` header, falling back to a `token`
/// query parameter (spec §4.1 "falls back to a query parameter").
fn extract_token(headers: &HeaderMap, query: &HashMap<String, String>) -> Option<String> {
    if let Some(value) = headers.get(axum::http::header::AUTHORIZATION) {
        if let Ok(s) = value.to_str() {
            if let Some(token) = s.strip_prefix("Bearer ") {
                return Some(token.to_string());
            }
        }
    }
    query.get("token").cloned()
}

async fn handle_socket(mut socket: WebSocket, core: Arc<Core>, token: Option<String>) {
    let Some(token) = token else {
        debug!("Gateway: connection closed, no token supplied");
        let _ = socket.close().await;
        return;
    };

    let identity = match core.token_verifier.verify(&token).await {
        Ok(identity) => identity,
        Err(e) => {
            debug!(error = %e, "Gateway: handshake rejected");
            let _ = socket.close().await;
            return;
        }
    };
    let user_id = identity.user_id;

    let handle = core.registry.new_handle();
    let (tx, mut rx) = mpsc::channel::<OutboundFrame>(64);
    if let Err(e) = core.registry.add(&handle, &user_id, tx).await {
        warn!(%user_id, error = %e, "Gateway: failed to register connection");
        let _ = socket.close().await;
        return;
    }
    info!(%user_id, %handle, "Gateway: connection established");
    crate::metrics::CONNECTED_USERS.inc();

    let (mut sink, mut stream) = socket.split();

    let outbound_task = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            let Ok(text) = serde_json::to_string(&frame) else { continue };
            if sink.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(msg)) = stream.next().await {
        match msg {
            Message::Text(text) => {
                if let Err(e) = dispatch::handle_frame(&core, &handle, &user_id, &text).await {
                    warn!(%user_id, error = %e, "Gateway: failed to deliver response frame");
                }
            }
            Message::Close(_) => break,
            _ => {}
        }
    }

    outbound_task.abort();
    disconnect(&core, &handle, &user_id).await;
}

/// Disconnect accounting (spec §4.1): clear the joined rooms' typing
/// flags and notify, then drop hot presence if this was the user's last
/// connection anywhere in the fleet.
async fn disconnect(core: &Core, handle: &str, user_id: &str) {
    let Some((user_id_confirmed, rooms, remaining_global)) = core.registry.remove(handle).await else {
        return;
    };
    debug_assert_eq!(user_id_confirmed, user_id);

    for room_id in &rooms {
        core.chat.leave(handle, user_id, room_id).await;
    }

    if remaining_global == 0 {
        core.location.clear_presence_if_disconnected(user_id).await;
    }

    crate::metrics::CONNECTED_USERS.dec();
    info!(%user_id, %handle, "Gateway: connection closed");
}
