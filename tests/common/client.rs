//! A minimal WebSocket test client speaking the `{event, data}` envelope,
//! in the teacher's thin `tests/common/client.rs` style
//! (`examples/sid3xyz-slircd-ng/tests/common/client.rs` wraps a raw
//! socket, not a full SDK), adapted to `tokio-tungstenite` per
//! `examples/zhubby-moltis/crates/gateway/tests/chat_ui.rs`'s
//! `connect_async` usage.

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

pub struct Client {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl Client {
    pub async fn connect(ws_url: &str, token: &str) -> Self {
        let url = format!("{ws_url}?token={token}");
        let (ws, _) = tokio_tungstenite::connect_async(url).await.expect("websocket connect");
        Self { ws }
    }

    pub async fn send(&mut self, event: &str, data: Value) {
        let frame = serde_json::json!({"event": event, "data": data});
        self.ws.send(Message::Text(frame.to_string())).await.expect("send frame");
    }

    /// Waits up to `timeout` for the next frame named `event`, discarding
    /// any other frame received first (broadcasts can interleave with
    /// an ack of a different event on the same socket).
    pub async fn expect_event(&mut self, event: &str, timeout: Duration) -> Value {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            let next = tokio::time::timeout(remaining, self.ws.next())
                .await
                .unwrap_or_else(|_| panic!("timed out waiting for {event}"));
            let msg = next.expect("stream ended").expect("websocket error");
            let Message::Text(text) = msg else { continue };
            let frame: Value = serde_json::from_str(&text).expect("malformed frame");
            if frame["event"] == event {
                return frame["data"].clone();
            }
        }
    }

    /// Asserts no frame named `event` arrives within `timeout` — used for
    /// the fan-out-gating negative assertions (spec invariant 3, S4).
    pub async fn expect_no_event(&mut self, event: &str, timeout: Duration) {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            if remaining.is_zero() {
                return;
            }
            match tokio::time::timeout(remaining, self.ws.next()).await {
                Err(_) => return,
                Ok(None) => return,
                Ok(Some(Err(_))) => return,
                Ok(Some(Ok(Message::Text(text)))) => {
                    let frame: Value = serde_json::from_str(&text).expect("malformed frame");
                    assert_ne!(frame["event"], event, "unexpected {event} frame: {frame}");
                }
                Ok(Some(Ok(_))) => continue,
            }
        }
    }
}
