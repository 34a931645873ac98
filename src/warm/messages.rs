//! `messages` CRUD plus the array-append `readBy` operation (spec §3
//! Message, §4.4).

use super::WarmClient;
use crate::error::AppError;
use crate::model::Message;
use ski_proto::{MessageMetadata, Room};
use sqlx::SqlitePool;

pub struct MessageRepository<'a> {
    pool: &'a SqlitePool,
    warm: &'a WarmClient,
}

/// The on-disk shape: `metadata` and `read_by` are stored as JSON text
/// since sqlite has neither a tagged-union column type nor an array type.
#[derive(sqlx::FromRow)]
struct MessageRow {
    id: String,
    sender_id: String,
    group_id: Option<String>,
    recipient_id: Option<String>,
    content: String,
    metadata: Option<String>,
    read_by: String,
    sent_at: i64,
}

impl MessageRow {
    fn into_message(self) -> Result<Message, AppError> {
        let metadata = self
            .metadata
            .as_deref()
            .map(serde_json::from_str::<MessageMetadata>)
            .transpose()
            .map_err(|e| AppError::Validation(format!("corrupt message metadata: {e}")))?;
        let read_by: Vec<String> = serde_json::from_str(&self.read_by)
            .map_err(|e| AppError::Validation(format!("corrupt readBy: {e}")))?;
        Ok(Message {
            id: self.id,
            sender_id: self.sender_id,
            group_id: self.group_id,
            recipient_id: self.recipient_id,
            content: self.content,
            metadata,
            read_by,
            sent_at: self.sent_at,
        })
    }
}

impl<'a> MessageRepository<'a> {
    pub(super) fn new(pool: &'a SqlitePool, warm: &'a WarmClient) -> Self {
        Self { pool, warm }
    }

    /// Durably insert a new message; the server assigns both `id` and
    /// `sentAt` (spec §4.4 `chat:send` step 2).
    pub async fn insert(
        &self,
        id: &str,
        sender_id: &str,
        group_id: Option<&str>,
        recipient_id: Option<&str>,
        content: &str,
        metadata: Option<&MessageMetadata>,
        sent_at: i64,
    ) -> Result<Message, AppError> {
        let metadata_json = metadata.map(serde_json::to_string).transpose().map_err(|e| AppError::Validation(e.to_string()))?;

        self.warm
            .with_timeout(
                "messages_insert",
                sqlx::query(
                    "INSERT INTO messages (id, sender_id, group_id, recipient_id, content, metadata, read_by, sent_at) \
                     VALUES (?, ?, ?, ?, ?, ?, '[]', ?)",
                )
                .bind(id)
                .bind(sender_id)
                .bind(group_id)
                .bind(recipient_id)
                .bind(content)
                .bind(&metadata_json)
                .bind(sent_at)
                .execute(self.pool),
            )
            .await?;

        Ok(Message {
            id: id.to_string(),
            sender_id: sender_id.to_string(),
            group_id: group_id.map(str::to_string),
            recipient_id: recipient_id.map(str::to_string),
            content: content.to_string(),
            metadata: metadata.cloned(),
            read_by: Vec::new(),
            sent_at,
        })
    }

    /// Up to `limit` messages for `room`, newest first.
    pub async fn history(&self, room: &Room, limit: i64) -> Result<Vec<Message>, AppError> {
        let rows: Vec<MessageRow> = match room {
            Room::Group(group_id) => {
                self.warm
                    .with_timeout(
                        "messages_history_group",
                        sqlx::query_as::<_, MessageRow>(
                            "SELECT * FROM messages WHERE group_id = ? ORDER BY sent_at DESC LIMIT ?",
                        )
                        .bind(group_id)
                        .bind(limit)
                        .fetch_all(self.pool),
                    )
                    .await?
            }
            Room::Dm(a, b) => {
                self.warm
                    .with_timeout(
                        "messages_history_dm",
                        sqlx::query_as::<_, MessageRow>(
                            "SELECT * FROM messages WHERE \
                             (sender_id = ? AND recipient_id = ?) OR (sender_id = ? AND recipient_id = ?) \
                             ORDER BY sent_at DESC LIMIT ?",
                        )
                        .bind(a)
                        .bind(b)
                        .bind(b)
                        .bind(a)
                        .bind(limit)
                        .fetch_all(self.pool),
                    )
                    .await?
            }
        };
        rows.into_iter().map(MessageRow::into_message).collect()
    }

    /// Idempotently add `user_id` to `readBy` (spec invariant 9). Fails
    /// with [`AppError::NotFound`] if `message_id` has no row — spec §7
    /// classifies a missing message as NotFound, not a silent success.
    pub async fn mark_read(&self, message_id: &str, user_id: &str) -> Result<(), AppError> {
        let existed = self
            .warm
            .with_timeout("messages_mark_read", async {
                let mut tx = self.pool.begin().await?;
                let row: Option<(String,)> = sqlx::query_as("SELECT read_by FROM messages WHERE id = ?")
                    .bind(message_id)
                    .fetch_optional(&mut *tx)
                    .await?;
                let Some((read_by_json,)) = row else {
                    tx.commit().await?;
                    return Ok(false);
                };

                let mut read_by: Vec<String> = serde_json::from_str(&read_by_json).unwrap_or_default();
                if !read_by.iter().any(|u| u == user_id) {
                    read_by.push(user_id.to_string());
                    let updated = serde_json::to_string(&read_by).unwrap_or_else(|_| "[]".to_string());
                    sqlx::query("UPDATE messages SET read_by = ? WHERE id = ?")
                        .bind(updated)
                        .bind(message_id)
                        .execute(&mut *tx)
                        .await?;
                }
                tx.commit().await?;
                Ok(true)
            })
            .await?;

        if existed {
            Ok(())
        } else {
            Err(AppError::NotFound(format!("message {message_id}")))
        }
    }
}
