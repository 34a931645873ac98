//! ConnectionRegistry (spec §4.5): a local map of connection handle to
//! (userId, subscribed rooms), plus the cross-node presence set in HOT.
//!
//! The registry also owns the decision of *which* Backplane channels this
//! node needs a live subscription to: it subscribes to `user:{userId}` for
//! every locally-hosted user (so any other node can push location updates
//! to them) and to `room:{roomId}` for every room a local connection has
//! joined, mirroring spec §9's "a node never holds connections for a user
//! it does not locally host."

use crate::backplane::Backplane;
use crate::hot::Connections;
use crate::hot::HotClient;
use dashmap::DashMap;
use ski_proto::OutboundFrame;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use tokio::sync::mpsc;
use tracing::warn;

pub type FrameSender = mpsc::Sender<OutboundFrame>;

struct LocalConnection {
    user_id: String,
    rooms: HashSet<String>,
    sender: FrameSender,
}

pub struct ConnectionRegistry {
    hot: HotClient,
    connections: DashMap<String, LocalConnection>,
    by_user: DashMap<String, HashSet<String>>,
    by_room: DashMap<String, HashSet<String>>,
    backplane: OnceLock<Arc<Backplane>>,
    next_handle: AtomicU64,
}

impl ConnectionRegistry {
    pub fn new(hot: HotClient) -> Arc<Self> {
        Arc::new(Self {
            hot,
            connections: DashMap::new(),
            by_user: DashMap::new(),
            by_room: DashMap::new(),
            backplane: OnceLock::new(),
            next_handle: AtomicU64::new(0),
        })
    }

    /// Must be called once, right after the Backplane is constructed
    /// (the two have a circular dependency: Backplane delivers to the
    /// registry, the registry subscribes through the Backplane).
    pub fn attach_backplane(&self, backplane: Arc<Backplane>) {
        let _ = self.backplane.set(backplane);
    }

    fn backplane(&self) -> &Arc<Backplane> {
        self.backplane.get().expect("backplane attached before first connection")
    }

    pub fn new_handle(&self) -> String {
        let n = self.next_handle.fetch_add(1, Ordering::Relaxed);
        format!("h{n}")
    }

    /// Register a freshly authenticated connection. Adds it to the HOT
    /// `connections:{userId}` set and, if this is the first local
    /// connection for that user, subscribes the node to `user:{userId}`.
    pub async fn add(&self, handle: &str, user_id: &str, sender: FrameSender) -> Result<(), crate::error::AppError> {
        Connections::add(&self.hot, user_id, handle).await?;

        self.connections.insert(
            handle.to_string(),
            LocalConnection { user_id: user_id.to_string(), rooms: HashSet::new(), sender },
        );

        let mut entry = self.by_user.entry(user_id.to_string()).or_default();
        let first_local = entry.is_empty();
        entry.insert(handle.to_string());
        drop(entry);

        if first_local {
            self.backplane().subscribe(&format!("user:{user_id}"));
        }
        Ok(())
    }

    /// Remove a connection. Returns the userId and the rooms it had
    /// joined, so the Gateway can run disconnect accounting (spec §4.1).
    /// Returns `None` if the handle was already removed.
    pub async fn remove(&self, handle: &str) -> Option<(String, Vec<String>, i64)> {
        let (user_id, rooms) = {
            let (_, conn) = self.connections.remove(handle)?;
            (conn.user_id, conn.rooms)
        };

        for room_id in &rooms {
            if let Some(mut set) = self.by_room.get_mut(room_id) {
                set.remove(handle);
                if set.is_empty() {
                    drop(set);
                    self.by_room.remove(room_id);
                    self.backplane().unsubscribe(&format!("room:{room_id}"));
                }
            }
        }

        let mut remaining_local = 0usize;
        if let Some(mut set) = self.by_user.get_mut(&user_id) {
            set.remove(handle);
            remaining_local = set.len();
            if set.is_empty() {
                drop(set);
                self.by_user.remove(&user_id);
            }
        }
        if remaining_local == 0 {
            self.backplane().unsubscribe(&format!("user:{user_id}"));
        }

        let remaining_global = match Connections::remove(&self.hot, &user_id, handle).await {
            Ok(n) => n,
            Err(e) => {
                warn!(error = %e, %user_id, "ConnectionRegistry: failed to remove global connection record");
                remaining_local as i64
            }
        };

        Some((user_id, rooms.into_iter().collect(), remaining_global))
    }

    pub fn join_room(&self, handle: &str, room_id: &str) {
        if let Some(mut conn) = self.connections.get_mut(handle) {
            conn.rooms.insert(room_id.to_string());
        }
        let mut set = self.by_room.entry(room_id.to_string()).or_default();
        let first_local = set.is_empty();
        set.insert(handle.to_string());
        drop(set);
        if first_local {
            self.backplane().subscribe(&format!("room:{room_id}"));
        }
    }

    pub fn leave_room(&self, handle: &str, room_id: &str) {
        if let Some(mut conn) = self.connections.get_mut(handle) {
            conn.rooms.remove(room_id);
        }
        if let Some(mut set) = self.by_room.get_mut(room_id) {
            set.remove(handle);
            if set.is_empty() {
                drop(set);
                self.by_room.remove(room_id);
                self.backplane().unsubscribe(&format!("room:{room_id}"));
            }
        }
    }

    pub fn rooms_of(&self, handle: &str) -> Vec<String> {
        self.connections.get(handle).map(|c| c.rooms.iter().cloned().collect()).unwrap_or_default()
    }

    pub async fn count_for_user(&self, user_id: &str) -> i64 {
        Connections::count(&self.hot, user_id).await.unwrap_or(0)
    }

    /// Deliver a decoded Backplane payload to every local connection
    /// interested in `channel` — either all connections in a room, or all
    /// connections belonging to a user.
    pub async fn deliver_to_channel(&self, channel: &str, payload: String) {
        let frame: OutboundFrame = match serde_json::from_str(&payload) {
            Ok(f) => f,
            Err(e) => {
                warn!(error = %e, %channel, "ConnectionRegistry: malformed Backplane payload");
                return;
            }
        };

        let handles: Vec<String> = if let Some(room_id) = channel.strip_prefix("room:") {
            self.by_room.get(room_id).map(|s| s.iter().cloned().collect()).unwrap_or_default()
        } else if let Some(user_id) = channel.strip_prefix("user:") {
            self.by_user.get(user_id).map(|s| s.iter().cloned().collect()).unwrap_or_default()
        } else {
            Vec::new()
        };

        for handle in handles {
            if let Some(conn) = self.connections.get(&handle) {
                let _ = conn.sender.send(frame.clone()).await;
            }
        }
    }

    /// Deliver directly to one local connection by handle, bypassing
    /// Backplane — used when the sender and recipient are on the same
    /// node and a round-trip through HOT pub/sub would be wasted latency.
    pub async fn deliver_to_handle(&self, handle: &str, frame: OutboundFrame) {
        if let Some(conn) = self.connections.get(handle) {
            let _ = conn.sender.send(frame).await;
        }
    }

    pub fn local_handles_for_user(&self, user_id: &str) -> Vec<String> {
        self.by_user.get(user_id).map(|s| s.iter().cloned().collect()).unwrap_or_default()
    }
}
