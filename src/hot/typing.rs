//! `typing:{roomId}:{userId}` — a fixed 5s TTL flag (spec §3 Typing flag).

use super::HotClient;
use crate::error::AppError;
use redis::AsyncCommands;

fn key(room_id: &str, user_id: &str) -> String {
    format!("typing:{room_id}:{user_id}")
}

pub struct Typing;

impl Typing {
    pub async fn set(hot: &HotClient, room_id: &str, user_id: &str, ttl_seconds: u64) -> Result<(), AppError> {
        let mut conn = hot.conn();
        hot.with_timeout("typing_set", conn.set_ex::<_, _, ()>(key(room_id, user_id), true, ttl_seconds)).await
    }

    pub async fn clear(hot: &HotClient, room_id: &str, user_id: &str) -> Result<(), AppError> {
        let mut conn = hot.conn();
        hot.with_timeout("typing_clear", conn.del::<_, ()>(key(room_id, user_id))).await
    }
}
