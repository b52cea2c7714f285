//! SQLite conversation repository implementation.
//!
//! Implements `ConversationRepository` from `ella-core` using sqlx with split
//! read/write pools. Resource and image lists are stored as JSON text.
//! Message order is insertion order (`rowid`).

use ella_core::repository::conversation::ConversationRepository;
use ella_types::conversation::{
    Conversation, ImageResult, Message, MessageSender, MessageStatus, MessageUpdate, Resource,
};
use ella_types::error::RepositoryError;
use ella_types::tool::Tool;
use sqlx::Row;
use uuid::Uuid;

use super::pool::DatabasePool;
use super::{format_datetime, parse_datetime, query_error};

/// SQLite-backed implementation of `ConversationRepository`.
#[derive(Clone)]
pub struct SqliteConversationRepository {
    pool: DatabasePool,
}

impl SqliteConversationRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

// ---------------------------------------------------------------------------
// Private Row types for SQLite-to-domain mapping
// ---------------------------------------------------------------------------

struct ConversationRow {
    id: String,
    clerk_id: String,
    title: String,
    created_at: String,
    updated_at: String,
}

impl ConversationRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            clerk_id: row.try_get("clerk_id")?,
            title: row.try_get("title")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_conversation(self) -> Result<Conversation, RepositoryError> {
        Ok(Conversation {
            id: parse_uuid(&self.id, "conversation id")?,
            clerk_id: self.clerk_id,
            title: self.title,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

struct MessageRow {
    id: String,
    clerk_id: String,
    conversation_id: String,
    sender: String,
    message_type: String,
    status: String,
    text: Option<String>,
    image_url: Option<String>,
    resources: Option<String>,
    images: Option<String>,
    created_at: String,
}

impl MessageRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            clerk_id: row.try_get("clerk_id")?,
            conversation_id: row.try_get("conversation_id")?,
            sender: row.try_get("sender")?,
            message_type: row.try_get("type")?,
            status: row.try_get("status")?,
            text: row.try_get("text")?,
            image_url: row.try_get("image_url")?,
            resources: row.try_get("resources")?,
            images: row.try_get("images")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_message(self) -> Result<Message, RepositoryError> {
        let sender: MessageSender = self.sender.parse().map_err(RepositoryError::Query)?;
        let message_type: Tool = self.message_type.parse().map_err(RepositoryError::Query)?;
        let status: MessageStatus = self.status.parse().map_err(RepositoryError::Query)?;
        let resources: Option<Vec<Resource>> = decode_json(self.resources.as_deref())?;
        let images: Option<Vec<ImageResult>> = decode_json(self.images.as_deref())?;

        Ok(Message {
            id: parse_uuid(&self.id, "message id")?,
            clerk_id: self.clerk_id,
            conversation_id: parse_uuid(&self.conversation_id, "conversation_id")?,
            sender,
            message_type,
            status,
            text: self.text,
            image_url: self.image_url,
            resources,
            images,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_uuid(s: &str, what: &str) -> Result<Uuid, RepositoryError> {
    Uuid::parse_str(s).map_err(|e| RepositoryError::Query(format!("invalid {what}: {e}")))
}

fn encode_json<T: serde::Serialize>(value: Option<&T>) -> Result<Option<String>, RepositoryError> {
    value
        .map(serde_json::to_string)
        .transpose()
        .map_err(|e| RepositoryError::Query(format!("failed to encode JSON column: {e}")))
}

fn decode_json<T: serde::de::DeserializeOwned>(
    raw: Option<&str>,
) -> Result<Option<T>, RepositoryError> {
    raw.map(serde_json::from_str)
        .transpose()
        .map_err(|e| RepositoryError::Query(format!("invalid JSON column: {e}")))
}

fn collect_conversations(
    rows: &[sqlx::sqlite::SqliteRow],
) -> Result<Vec<Conversation>, RepositoryError> {
    rows.iter()
        .map(|row| {
            ConversationRow::from_row(row)
                .map_err(query_error)?
                .into_conversation()
        })
        .collect()
}

fn collect_messages(rows: &[sqlx::sqlite::SqliteRow]) -> Result<Vec<Message>, RepositoryError> {
    rows.iter()
        .map(|row| MessageRow::from_row(row).map_err(query_error)?.into_message())
        .collect()
}

const TOUCH_CONVERSATION: &str = "UPDATE conversations SET updated_at = ? WHERE id = ?";

// ---------------------------------------------------------------------------
// ConversationRepository implementation
// ---------------------------------------------------------------------------

impl ConversationRepository for SqliteConversationRepository {
    async fn create_conversation(&self, conversation: &Conversation) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO conversations (id, clerk_id, title, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(conversation.id.to_string())
        .bind(&conversation.clerk_id)
        .bind(&conversation.title)
        .bind(format_datetime(&conversation.created_at))
        .bind(format_datetime(&conversation.updated_at))
        .execute(&self.pool.writer)
        .await
        .map_err(query_error)?;
        Ok(())
    }

    async fn get_conversation(&self, id: &Uuid) -> Result<Option<Conversation>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM conversations WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_error)?;

        row.map(|row| {
            ConversationRow::from_row(&row)
                .map_err(query_error)?
                .into_conversation()
        })
        .transpose()
    }

    async fn list_conversations(&self, clerk_id: &str) -> Result<Vec<Conversation>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT * FROM conversations WHERE clerk_id = ? ORDER BY updated_at DESC",
        )
        .bind(clerk_id)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_error)?;
        collect_conversations(&rows)
    }

    async fn update_conversation_title(&self, id: &Uuid, title: &str) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE conversations SET title = ?, updated_at = ? WHERE id = ?")
            .bind(title)
            .bind(format_datetime(&chrono::Utc::now()))
            .bind(id.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(query_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn delete_conversation(&self, id: &Uuid) -> Result<bool, RepositoryError> {
        let mut tx = self.pool.writer.begin().await.map_err(query_error)?;

        sqlx::query("DELETE FROM messages WHERE conversation_id = ?")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(query_error)?;

        let result = sqlx::query("DELETE FROM conversations WHERE id = ?")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(query_error)?;

        tx.commit().await.map_err(query_error)?;
        Ok(result.rows_affected() > 0)
    }

    async fn search_conversations(
        &self,
        clerk_id: &str,
        term: &str,
    ) -> Result<Vec<Conversation>, RepositoryError> {
        // instr() on lower() keeps `%` and `_` in the term literal.
        // An empty term matches every conversation of the owner.
        let rows = sqlx::query(
            "SELECT c.* FROM conversations c
             WHERE c.clerk_id = ?1
               AND (?2 = ''
                    OR instr(lower(c.title), lower(?2)) > 0
                    OR EXISTS (
                        SELECT 1 FROM messages m
                        WHERE m.conversation_id = c.id
                          AND m.clerk_id = ?1
                          AND instr(lower(coalesce(m.text, '')), lower(?2)) > 0))
             ORDER BY c.updated_at DESC",
        )
        .bind(clerk_id)
        .bind(term)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_error)?;
        collect_conversations(&rows)
    }

    async fn create_message(&self, message: &Message) -> Result<(), RepositoryError> {
        let mut tx = self.pool.writer.begin().await.map_err(query_error)?;

        sqlx::query(
            r#"INSERT INTO messages (id, clerk_id, conversation_id, sender, type, status, text, image_url, resources, images, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(message.id.to_string())
        .bind(&message.clerk_id)
        .bind(message.conversation_id.to_string())
        .bind(message.sender.to_string())
        .bind(message.message_type.to_string())
        .bind(message.status.to_string())
        .bind(&message.text)
        .bind(&message.image_url)
        .bind(encode_json(message.resources.as_ref())?)
        .bind(encode_json(message.images.as_ref())?)
        .bind(format_datetime(&message.created_at))
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e {
                if db_err.message().contains("FOREIGN KEY") {
                    return RepositoryError::NotFound;
                }
                if db_err.message().contains("UNIQUE") {
                    return RepositoryError::Conflict(format!(
                        "message {} already exists",
                        message.id
                    ));
                }
            }
            query_error(e)
        })?;

        sqlx::query(TOUCH_CONVERSATION)
            .bind(format_datetime(&chrono::Utc::now()))
            .bind(message.conversation_id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(query_error)?;

        tx.commit().await.map_err(query_error)?;
        Ok(())
    }

    async fn get_message(&self, id: &Uuid) -> Result<Option<Message>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM messages WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_error)?;

        row.map(|row| MessageRow::from_row(&row).map_err(query_error)?.into_message())
            .transpose()
    }

    async fn update_message(&self, id: &Uuid, update: &MessageUpdate) -> Result<(), RepositoryError> {
        let mut tx = self.pool.writer.begin().await.map_err(query_error)?;

        let conversation_id: Option<String> =
            sqlx::query_scalar("SELECT conversation_id FROM messages WHERE id = ?")
                .bind(id.to_string())
                .fetch_optional(&mut *tx)
                .await
                .map_err(query_error)?;
        let Some(conversation_id) = conversation_id else {
            return Err(RepositoryError::NotFound);
        };

        sqlx::query(
            "UPDATE messages
             SET status = ?, type = ?, text = ?, resources = ?, images = ?, image_url = ?
             WHERE id = ?",
        )
        .bind(update.status.to_string())
        .bind(update.message_type.to_string())
        .bind(&update.text)
        .bind(encode_json(update.resources.as_ref())?)
        .bind(encode_json(update.images.as_ref())?)
        .bind(&update.image_url)
        .bind(id.to_string())
        .execute(&mut *tx)
        .await
        .map_err(query_error)?;

        sqlx::query(TOUCH_CONVERSATION)
            .bind(format_datetime(&chrono::Utc::now()))
            .bind(&conversation_id)
            .execute(&mut *tx)
            .await
            .map_err(query_error)?;

        tx.commit().await.map_err(query_error)?;
        Ok(())
    }

    async fn list_messages(&self, conversation_id: &Uuid) -> Result<Vec<Message>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM messages WHERE conversation_id = ? ORDER BY rowid ASC")
            .bind(conversation_id.to_string())
            .fetch_all(&self.pool.reader)
            .await
            .map_err(query_error)?;
        collect_messages(&rows)
    }

    async fn get_previous_messages(
        &self,
        conversation_id: &Uuid,
        clerk_id: &str,
        limit: u32,
        exclude: Option<&Uuid>,
    ) -> Result<Vec<Message>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT * FROM (
                 SELECT rowid AS seq, * FROM messages
                 WHERE conversation_id = ? AND clerk_id = ? AND id != ?
                 ORDER BY rowid DESC
                 LIMIT ?
             ) ORDER BY seq ASC",
        )
        .bind(conversation_id.to_string())
        .bind(clerk_id)
        .bind(exclude.map(Uuid::to_string).unwrap_or_default())
        .bind(i64::from(limit))
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_error)?;
        collect_messages(&rows)
    }

    async fn list_generated_images(&self, clerk_id: &str) -> Result<Vec<Message>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT * FROM messages WHERE clerk_id = ? AND type = 'image' ORDER BY rowid DESC",
        )
        .bind(clerk_id)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_error)?;
        collect_messages(&rows)
    }
}
