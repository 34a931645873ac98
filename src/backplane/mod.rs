//! The horizontal scaling substrate (spec §4.6, §9): publish/subscribe is
//! the ONLY cross-node mechanism. A node never holds connections for a
//! user it doesn't locally host — to reach one, it publishes on
//! `user:{userId}` or `room:{roomId}` and whichever node currently hosts
//! that connection delivers locally.

use crate::hot::HotClient;
use crate::state::registry::ConnectionRegistry;
use dashmap::DashMap;
use futures_util::StreamExt;
use ski_proto::OutboundFrame;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

enum SubCommand {
    Subscribe(String),
    Unsubscribe(String),
}

/// Node-global reference-counted subscription manager plus publish
/// handle. Shared by reference across `ChatEngine` and `LocationEngine`.
pub struct Backplane {
    refcounts: DashMap<String, usize>,
    cmd_tx: mpsc::UnboundedSender<SubCommand>,
    hot: HotClient,
}

impl Backplane {
    /// Spawns the long-lived pub/sub task and starts delivering inbound
    /// messages to local connections via `registry`.
    pub fn start(hot: HotClient, registry: Arc<ConnectionRegistry>) -> Arc<Self> {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let client = hot.pubsub_client();
        tokio::spawn(run_pubsub_task(client, cmd_rx, registry));
        Arc::new(Self { refcounts: DashMap::new(), cmd_tx, hot })
    }

    /// Subscribe the node to `channel` if this is the first local
    /// interest in it.
    pub fn subscribe(&self, channel: &str) {
        let mut count = self.refcounts.entry(channel.to_string()).or_insert(0);
        *count += 1;
        if *count == 1 {
            let _ = self.cmd_tx.send(SubCommand::Subscribe(channel.to_string()));
        }
    }

    /// Unsubscribe the node from `channel` if this was the last local
    /// interest in it.
    pub fn unsubscribe(&self, channel: &str) {
        let Some(mut count) = self.refcounts.get_mut(channel) else { return };
        if *count == 0 {
            return;
        }
        *count -= 1;
        let should_unsub = *count == 0;
        drop(count);
        if should_unsub {
            self.refcounts.remove(channel);
            let _ = self.cmd_tx.send(SubCommand::Unsubscribe(channel.to_string()));
        }
    }

    pub async fn publish(&self, channel: &str, frame: &OutboundFrame) -> Result<(), crate::error::AppError> {
        let payload = serde_json::to_string(frame).map_err(|e| crate::error::AppError::Validation(e.to_string()))?;
        let mut conn = self.hot.conn_for_publish();
        self.hot.with_timeout_pub("backplane_publish", redis::AsyncCommands::publish(&mut conn, channel, payload)).await
    }
}

async fn run_pubsub_task(
    client: redis::Client,
    mut cmd_rx: mpsc::UnboundedReceiver<SubCommand>,
    registry: Arc<ConnectionRegistry>,
) {
    let mut pubsub = match client.get_async_pubsub().await {
        Ok(p) => p,
        Err(e) => {
            error!(error = %e, "Backplane: failed to open pub/sub connection");
            return;
        }
    };

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(SubCommand::Subscribe(channel)) => {
                        if let Err(e) = pubsub.subscribe(&channel).await {
                            warn!(error = %e, %channel, "Backplane: subscribe failed");
                        } else {
                            debug!(%channel, "Backplane: subscribed");
                        }
                    }
                    Some(SubCommand::Unsubscribe(channel)) => {
                        if let Err(e) = pubsub.unsubscribe(&channel).await {
                            warn!(error = %e, %channel, "Backplane: unsubscribe failed");
                        } else {
                            debug!(%channel, "Backplane: unsubscribed");
                        }
                    }
                    None => {
                        debug!("Backplane: command channel closed, shutting down");
                        return;
                    }
                }
            }
            msg = pubsub.on_message().next() => {
                let Some(msg) = msg else { continue };
                let channel: String = msg.get_channel_name().to_string();
                let payload: String = match msg.get_payload() {
                    Ok(p) => p,
                    Err(e) => { warn!(error = %e, "Backplane: bad pub/sub payload"); continue; }
                };
                registry.deliver_to_channel(&channel, payload).await;
            }
        }
    }
}
