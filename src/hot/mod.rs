//! HOT client: a typed wrapper over the shared in-memory datastore (spec
//! §6). Operationally a Redis-shaped store reached through the `redis`
//! crate's async, connection-managed client so a transient network blip
//! reconnects rather than poisoning the handle.

mod chat_cache;
mod connections;
mod presence;
mod subscribe;
mod typing;

pub use chat_cache::ChatCache;
pub use connections::Connections;
pub use presence::Presence;
pub use subscribe::Subscribe;
pub use typing::Typing;

use crate::config::HotConfig;
use crate::error::AppError;
use redis::aio::ConnectionManager;
use std::time::Duration;

/// Shared by reference across every handler and background worker; built
/// once at process start (spec §9 "ownership of hot caches").
#[derive(Clone)]
pub struct HotClient {
    manager: ConnectionManager,
    client: redis::Client,
    timeout: Duration,
}

impl HotClient {
    pub async fn connect(config: &HotConfig) -> Result<Self, AppError> {
        let mut url = config.endpoint.clone();
        if let Some(password) = &config.password {
            url = apply_password(&url, password);
        }
        let client = redis::Client::open(url)?;
        let manager = client.get_connection_manager().await?;
        Ok(Self {
            manager,
            client,
            timeout: Duration::from_millis(config.timeout_ms),
        })
    }

    fn conn(&self) -> ConnectionManager {
        self.manager.clone()
    }

    /// A connection handle for callers outside this module that need a
    /// raw command (currently just the Backplane's `PUBLISH`).
    pub fn conn_for_publish(&self) -> ConnectionManager {
        self.manager.clone()
    }

    /// Exposes the timeout wrapper to callers outside this module.
    pub async fn with_timeout_pub<T>(
        &self,
        op: &'static str,
        fut: impl std::future::Future<Output = redis::RedisResult<T>>,
    ) -> Result<T, AppError> {
        self.with_timeout(op, fut).await
    }

    /// A dedicated (non-pooled) client handle for the Backplane's
    /// long-lived pub/sub connection — pub/sub connections can't share the
    /// connection-managed pool used for regular commands.
    pub fn pubsub_client(&self) -> redis::Client {
        self.client.clone()
    }

    /// Run a HOT call under the operator-tunable timeout from spec §5;
    /// expiry surfaces as [`AppError::HotTimeout`]. `op` labels the
    /// latency histogram so per-command cost is visible on `/metrics`.
    async fn with_timeout<T>(
        &self,
        op: &'static str,
        fut: impl std::future::Future<Output = redis::RedisResult<T>>,
    ) -> Result<T, AppError> {
        let started = std::time::Instant::now();
        let result = match tokio::time::timeout(self.timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(AppError::Hot(e)),
            Err(_) => {
                crate::metrics::HOT_TIMEOUTS.inc();
                Err(AppError::HotTimeout)
            }
        };
        crate::metrics::HOT_CALL_LATENCY.with_label_values(&[op]).observe(started.elapsed().as_secs_f64());
        result
    }
}

fn apply_password(url: &str, password: &str) -> String {
    if let Some(rest) = url.strip_prefix("redis://") {
        format!("redis://:{password}@{rest}")
    } else {
        url.to_string()
    }
}
