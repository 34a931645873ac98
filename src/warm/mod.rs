//! WARM client: the durable relational store (spec §6) owning
//! `ski_sessions`, `location_pings`, `messages`, plus read-only lookups
//! against `friendships`, `group_members`, `users`.
//!
//! Operationally sqlite (matching the teacher's `Database` exactly); the
//! repository boundary is what would absorb a `postgres` feature flag
//! later without touching call sites.

mod dead_letters;
mod friendships;
mod groups;
mod messages;
mod pings;
mod sessions;
mod users;

pub use dead_letters::DeadLetterRepository;
pub use friendships::FriendshipRepository;
pub use groups::GroupRepository;
pub use messages::MessageRepository;
pub use pings::PingRepository;
pub use sessions::SessionRepository;
pub use users::UserRepository;

use crate::config::WarmConfig;
use crate::error::AppError;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

#[derive(Clone)]
pub struct WarmClient {
    pool: SqlitePool,
    timeout: Duration,
}

impl WarmClient {
    pub async fn connect(config: &WarmConfig) -> Result<Self, AppError> {
        let options = SqliteConnectOptions::from_str(&config.dsn)
            .map_err(|e| AppError::Fatal(format!("invalid warm.dsn: {e}")))?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(5))
            .test_before_acquire(true)
            .connect_with(options)
            .await?;

        Self::run_migration(&pool, include_str!("../../migrations/001_init.sql")).await;

        info!(dsn = %config.dsn, "WARM store connected");
        Ok(Self { pool, timeout: Duration::from_millis(config.timeout_ms) })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Execute each `;`-separated statement in a schema file, tolerating
    /// "already exists" on repeated startup against the same database.
    async fn run_migration(pool: &SqlitePool, migration: &str) {
        for statement in migration.split(';') {
            let lines: Vec<&str> = statement
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty() && !l.starts_with("--"))
                .collect();
            if lines.is_empty() {
                continue;
            }
            let sql = lines.join("\n");
            if let Err(e) = sqlx::query(&sql).execute(pool).await {
                if !e.to_string().contains("already exists") {
                    tracing::warn!(sql = %sql, error = %e, "warm migration statement failed");
                }
            }
        }
    }

    /// Run a WARM call under the operator-tunable timeout from spec §5;
    /// expiry surfaces as [`AppError::WarmTimeout`]. `op` labels the
    /// latency histogram so per-query cost is visible on `/metrics`.
    pub(crate) async fn with_timeout<T>(
        &self,
        op: &'static str,
        fut: impl std::future::Future<Output = Result<T, sqlx::Error>>,
    ) -> Result<T, AppError> {
        let started = std::time::Instant::now();
        let result = match tokio::time::timeout(self.timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(AppError::Warm(e)),
            Err(_) => {
                crate::metrics::WARM_TIMEOUTS.inc();
                Err(AppError::WarmTimeout)
            }
        };
        crate::metrics::WARM_CALL_LATENCY.with_label_values(&[op]).observe(started.elapsed().as_secs_f64());
        result
    }

    pub fn sessions(&self) -> SessionRepository<'_> {
        SessionRepository::new(&self.pool, self)
    }

    pub fn pings(&self) -> PingRepository<'_> {
        PingRepository::new(&self.pool, self)
    }

    pub fn messages(&self) -> MessageRepository<'_> {
        MessageRepository::new(&self.pool, self)
    }

    pub fn friendships(&self) -> FriendshipRepository<'_> {
        FriendshipRepository::new(&self.pool, self)
    }

    pub fn groups(&self) -> GroupRepository<'_> {
        GroupRepository::new(&self.pool, self)
    }

    pub fn users(&self) -> UserRepository<'_> {
        UserRepository::new(&self.pool, self)
    }

    pub fn dead_letters(&self) -> DeadLetterRepository<'_> {
        DeadLetterRepository::new(&self.pool, self)
    }
}
