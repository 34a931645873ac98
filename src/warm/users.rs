//! Read-only user display-name lookup — the core never writes this table.

use super::WarmClient;
use crate::error::AppError;
use sqlx::SqlitePool;

pub struct UserRepository<'a> {
    pool: &'a SqlitePool,
    warm: &'a WarmClient,
}

impl<'a> UserRepository<'a> {
    pub(super) fn new(pool: &'a SqlitePool, warm: &'a WarmClient) -> Self {
        Self { pool, warm }
    }

    pub async fn display_name(&self, user_id: &str) -> Result<Option<String>, AppError> {
        let row: Option<(String,)> = self
            .warm
            .with_timeout(
                "users_display_name",
                sqlx::query_as("SELECT display_name FROM users WHERE id = ?").bind(user_id).fetch_optional(self.pool),
            )
            .await?;
        Ok(row.map(|(name,)| name))
    }
}
