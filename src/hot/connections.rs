//! The cross-node half of presence: `connections:{userId}`, a HOT set of
//! opaque connection-handle ids. Size > 0 ⇔ the user is online somewhere
//! in the fleet (spec §3 Connection record).

use super::HotClient;
use crate::error::AppError;
use redis::AsyncCommands;

fn key(user_id: &str) -> String {
    format!("connections:{user_id}")
}

pub struct Connections;

impl Connections {
    pub async fn add(hot: &HotClient, user_id: &str, handle: &str) -> Result<(), AppError> {
        let mut conn = hot.conn();
        hot.with_timeout("connections_add", conn.sadd::<_, _, ()>(key(user_id), handle)).await
    }

    /// Returns the number of handles remaining for this user after removal.
    pub async fn remove(hot: &HotClient, user_id: &str, handle: &str) -> Result<i64, AppError> {
        let mut conn = hot.conn();
        hot.with_timeout("connections_remove", conn.srem::<_, _, ()>(key(user_id), handle)).await?;
        hot.with_timeout("connections_count", conn.scard(key(user_id))).await
    }

    pub async fn members(hot: &HotClient, user_id: &str) -> Result<Vec<String>, AppError> {
        let mut conn = hot.conn();
        hot.with_timeout("connections_members", conn.smembers(key(user_id))).await
    }

    pub async fn count(hot: &HotClient, user_id: &str) -> Result<i64, AppError> {
        let mut conn = hot.conn();
        hot.with_timeout("connections_count", conn.scard(key(user_id))).await
    }
}
