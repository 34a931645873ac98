//! `subscribe:{userId}` — the declared-interest set from `location:subscribe`
//! (spec §4.2, §9 Open Question 1). Stored but NOT consulted by fan-out:
//! the authoritative gate stays friendship, as the spec directs.

use super::HotClient;
use crate::error::AppError;
use redis::AsyncCommands;

fn key(user_id: &str) -> String {
    format!("subscribe:{user_id}")
}

pub struct Subscribe;

impl Subscribe {
    pub async fn set(hot: &HotClient, user_id: &str, friend_ids: &[String]) -> Result<(), AppError> {
        let mut conn = hot.conn();
        let key = key(user_id);
        hot.with_timeout("subscribe_del", conn.del::<_, ()>(&key)).await?;
        if !friend_ids.is_empty() {
            hot.with_timeout("subscribe_sadd", conn.sadd::<_, _, ()>(&key, friend_ids)).await?;
        }
        Ok(())
    }
}
