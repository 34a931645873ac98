//! Read-only group-membership lookups — the core never writes this table.

use super::WarmClient;
use crate::error::AppError;
use sqlx::SqlitePool;

pub struct GroupRepository<'a> {
    pool: &'a SqlitePool,
    warm: &'a WarmClient,
}

impl<'a> GroupRepository<'a> {
    pub(super) fn new(pool: &'a SqlitePool, warm: &'a WarmClient) -> Self {
        Self { pool, warm }
    }

    pub async fn is_member(&self, group_id: &str, user_id: &str) -> Result<bool, AppError> {
        let row: Option<(i64,)> = self
            .warm
            .with_timeout(
                "groups_is_member",
                sqlx::query_as("SELECT 1 FROM group_members WHERE group_id = ? AND user_id = ? LIMIT 1")
                    .bind(group_id)
                    .bind(user_id)
                    .fetch_optional(self.pool),
            )
            .await?;
        Ok(row.is_some())
    }
}
