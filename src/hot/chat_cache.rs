//! `chat:{roomId}:messages` — head=newest, length <= `chatCacheSize`, TTL
//! refreshed on every write and on every read (spec §3 Message, §4.4).

use super::HotClient;
use crate::error::AppError;
use crate::model::Message;
use redis::AsyncCommands;

fn key(room_id: &str) -> String {
    format!("chat:{room_id}:messages")
}

pub struct ChatCache;

impl ChatCache {
    /// Push one newly sent message onto the head, trim to `max_len`,
    /// refresh the TTL.
    pub async fn push(
        hot: &HotClient,
        room_id: &str,
        message: &Message,
        max_len: usize,
        ttl_seconds: u64,
    ) -> Result<(), AppError> {
        let key = key(room_id);
        let encoded = serde_json::to_string(message).map_err(|e| AppError::Validation(e.to_string()))?;
        let mut conn = hot.conn();
        hot.with_timeout("chat_cache_push", conn.lpush::<_, _, ()>(&key, encoded)).await?;
        hot.with_timeout("chat_cache_ltrim", conn.ltrim::<_, ()>(&key, 0, max_len as isize - 1)).await?;
        hot.with_timeout("chat_cache_expire", conn.expire::<_, ()>(&key, ttl_seconds as i64)).await?;
        Ok(())
    }

    /// Read up to `limit` entries, head-first (newest-first), refreshing
    /// the TTL on access.
    pub async fn read(hot: &HotClient, room_id: &str, limit: usize, ttl_seconds: u64) -> Result<Vec<Message>, AppError> {
        let key = key(room_id);
        let mut conn = hot.conn();
        let raw: Vec<String> = hot.with_timeout("chat_cache_lrange", conn.lrange(&key, 0, limit as isize - 1)).await?;
        if !raw.is_empty() {
            hot.with_timeout("chat_cache_expire", conn.expire::<_, ()>(&key, ttl_seconds as i64)).await?;
        }
        Ok(raw.into_iter().filter_map(|s| serde_json::from_str(&s).ok()).collect())
    }

    /// Refill the cache from WARM history. `messages` must already be
    /// ordered oldest-first so the head ends up newest after the pushes.
    pub async fn refill(
        hot: &HotClient,
        room_id: &str,
        messages: &[Message],
        max_len: usize,
        ttl_seconds: u64,
    ) -> Result<(), AppError> {
        let key = key(room_id);
        let mut conn = hot.conn();
        hot.with_timeout("chat_cache_del", conn.del::<_, ()>(&key)).await?;
        for message in messages {
            let encoded = serde_json::to_string(message).map_err(|e| AppError::Validation(e.to_string()))?;
            hot.with_timeout("chat_cache_push", conn.lpush::<_, _, ()>(&key, encoded)).await?;
        }
        if !messages.is_empty() {
            hot.with_timeout("chat_cache_ltrim", conn.ltrim::<_, ()>(&key, 0, max_len as isize - 1)).await?;
            hot.with_timeout("chat_cache_expire", conn.expire::<_, ()>(&key, ttl_seconds as i64)).await?;
        }
        Ok(())
    }
}
