//! Read-only friendship lookups — the core never writes this table.

use super::WarmClient;
use crate::error::AppError;
use sqlx::SqlitePool;

pub struct FriendshipRepository<'a> {
    pool: &'a SqlitePool,
    warm: &'a WarmClient,
}

impl<'a> FriendshipRepository<'a> {
    pub(super) fn new(pool: &'a SqlitePool, warm: &'a WarmClient) -> Self {
        Self { pool, warm }
    }

    /// Direction-agnostic: accepted iff a row exists for either ordering.
    pub async fn is_accepted(&self, user_a: &str, user_b: &str) -> Result<bool, AppError> {
        let row: Option<(i64,)> = self
            .warm
            .with_timeout(
                "friendships_is_accepted",
                sqlx::query_as(
                    "SELECT 1 FROM friendships WHERE status = 'accepted' AND \
                     ((user_a = ? AND user_b = ?) OR (user_a = ? AND user_b = ?)) LIMIT 1",
                )
                .bind(user_a)
                .bind(user_b)
                .bind(user_b)
                .bind(user_a)
                .fetch_optional(self.pool),
            )
            .await?;
        Ok(row.is_some())
    }

    /// All userIds with an accepted friendship with `user_id`, either side.
    pub async fn accepted_friend_ids(&self, user_id: &str) -> Result<Vec<String>, AppError> {
        let rows: Vec<(String,)> = self
            .warm
            .with_timeout(
                "friendships_accepted_friend_ids",
                sqlx::query_as(
                    "SELECT user_b FROM friendships WHERE status = 'accepted' AND user_a = ? \
                     UNION \
                     SELECT user_a FROM friendships WHERE status = 'accepted' AND user_b = ?",
                )
                .bind(user_id)
                .bind(user_id)
                .fetch_all(self.pool),
            )
            .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }
}
