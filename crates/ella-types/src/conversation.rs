//! Conversation and message types.
//!
//! A conversation is a chat thread owned by a single user. Messages are the
//! turns within it. Assistant turns follow a placeholder-then-patch life
//! cycle: they are inserted `pending` before any provider call and moved to
//! a terminal status exactly once.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

use crate::tool::Tool;

/// Title given to a conversation when it is first created.
pub const DEFAULT_CONVERSATION_TITLE: &str = "Untitled Conversation";

/// A chat thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: Uuid,
    /// External identity of the owner.
    pub clerk_id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    /// A fresh, empty conversation with the placeholder title.
    pub fn new(clerk_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            clerk_id: clerk_id.into(),
            title: DEFAULT_CONVERSATION_TITLE.to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_owned_by(&self, clerk_id: &str) -> bool {
        self.clerk_id == clerk_id
    }
}

/// Who sent a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageSender {
    User,
    #[serde(alias = "ella")]
    Assistant,
}

impl fmt::Display for MessageSender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageSender::User => write!(f, "user"),
            MessageSender::Assistant => write!(f, "assistant"),
        }
    }
}

impl FromStr for MessageSender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(MessageSender::User),
            "assistant" | "ella" => Ok(MessageSender::Assistant),
            other => Err(format!("invalid message sender: '{other}'")),
        }
    }
}

/// Lifecycle status of a message.
///
/// Maps to the CHECK constraint in the SQLite schema:
/// `CHECK (status IN ('pending', 'completed', 'failed'))`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    Pending,
    Completed,
    Failed,
}

impl MessageStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, MessageStatus::Pending)
    }
}

impl fmt::Display for MessageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageStatus::Pending => write!(f, "pending"),
            MessageStatus::Completed => write!(f, "completed"),
            MessageStatus::Failed => write!(f, "failed"),
        }
    }
}

impl FromStr for MessageStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(MessageStatus::Pending),
            "completed" => Ok(MessageStatus::Completed),
            "failed" => Ok(MessageStatus::Failed),
            other => Err(format!("invalid message status: '{other}'")),
        }
    }
}

/// A web page cited by a `web` answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub url: String,
    pub favicon: String,
}

/// An image returned by web search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageResult {
    pub url: String,
    #[serde(default)]
    pub description: String,
}

/// One turn in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: Uuid,
    pub clerk_id: String,
    pub conversation_id: Uuid,
    pub sender: MessageSender,
    #[serde(rename = "type")]
    pub message_type: Tool,
    pub status: MessageStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<Vec<Resource>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<ImageResult>>,
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// A user turn. User messages need no async work and are born completed.
    pub fn user(clerk_id: impl Into<String>, conversation_id: Uuid, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            clerk_id: clerk_id.into(),
            conversation_id,
            sender: MessageSender::User,
            message_type: Tool::Text,
            status: MessageStatus::Completed,
            text: Some(text.into()),
            image_url: None,
            resources: None,
            images: None,
            created_at: Utc::now(),
        }
    }

    /// An assistant placeholder awaiting the background job.
    pub fn placeholder(clerk_id: impl Into<String>, conversation_id: Uuid, tool: Tool) -> Self {
        Self {
            id: Uuid::now_v7(),
            clerk_id: clerk_id.into(),
            conversation_id,
            sender: MessageSender::Assistant,
            message_type: tool,
            status: MessageStatus::Pending,
            text: Some(String::new()),
            image_url: None,
            resources: None,
            images: None,
            created_at: Utc::now(),
        }
    }
}

/// Terminal patch applied to an assistant placeholder.
///
/// Every field of the patch replaces the stored value (absent lists and
/// URLs clear the column), so applying the same update twice leaves the
/// row unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageUpdate {
    pub status: MessageStatus,
    #[serde(rename = "type")]
    pub message_type: Tool,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<Vec<Resource>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<ImageResult>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl MessageUpdate {
    pub fn completed_text(text: impl Into<String>) -> Self {
        Self {
            status: MessageStatus::Completed,
            message_type: Tool::Text,
            text: text.into(),
            resources: None,
            images: None,
            image_url: None,
        }
    }

    pub fn completed_web(
        text: impl Into<String>,
        resources: Vec<Resource>,
        images: Vec<ImageResult>,
    ) -> Self {
        Self {
            status: MessageStatus::Completed,
            message_type: Tool::Web,
            text: text.into(),
            resources: Some(resources),
            images: Some(images),
            image_url: None,
        }
    }

    pub fn completed_image(image_url: impl Into<String>) -> Self {
        Self {
            status: MessageStatus::Completed,
            message_type: Tool::Image,
            text: String::new(),
            resources: None,
            images: None,
            image_url: Some(image_url.into()),
        }
    }

    pub fn failed(message_type: Tool, text: impl Into<String>) -> Self {
        Self {
            status: MessageStatus::Failed,
            message_type,
            text: text.into(),
            resources: None,
            images: None,
            image_url: None,
        }
    }
}
