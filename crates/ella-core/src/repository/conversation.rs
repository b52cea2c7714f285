//! Conversation repository trait definition.
//!
//! Defines the storage interface for conversations and their messages. The
//! infrastructure layer (ella-infra) implements this trait with SQLite
//! persistence.

use ella_types::conversation::{Conversation, Message, MessageUpdate};
use ella_types::error::RepositoryError;
use uuid::Uuid;

/// Repository trait for conversation and message persistence.
///
/// Ownership checks are the caller's job; this layer only filters by owner
/// where a query is naturally owner-scoped (listing, search, context).
///
/// Uses native async fn in traits (Rust 2024 edition, no async_trait macro).
pub trait ConversationRepository: Send + Sync {
    // -----------------------------------------------------------------------
    // Conversations
    // -----------------------------------------------------------------------

    fn create_conversation(
        &self,
        conversation: &Conversation,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    fn get_conversation(
        &self,
        id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<Conversation>, RepositoryError>> + Send;

    /// All conversations of an owner, most recently updated first.
    fn list_conversations(
        &self,
        clerk_id: &str,
    ) -> impl std::future::Future<Output = Result<Vec<Conversation>, RepositoryError>> + Send;

    /// Set the title and bump `updated_at`. Returns `NotFound` if missing.
    fn update_conversation_title(
        &self,
        id: &Uuid,
        title: &str,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Delete all messages of a conversation, then the conversation itself,
    /// in one transaction. Returns `true` if the conversation existed.
    fn delete_conversation(
        &self,
        id: &Uuid,
    ) -> impl std::future::Future<Output = Result<bool, RepositoryError>> + Send;

    /// Case-insensitive substring search over an owner's conversation titles
    /// and message texts. De-duplicated, most recently updated first.
    fn search_conversations(
        &self,
        clerk_id: &str,
        term: &str,
    ) -> impl std::future::Future<Output = Result<Vec<Conversation>, RepositoryError>> + Send;

    // -----------------------------------------------------------------------
    // Messages
    // -----------------------------------------------------------------------

    /// Insert a message and bump the parent conversation's `updated_at`.
    fn create_message(
        &self,
        message: &Message,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    fn get_message(
        &self,
        id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<Message>, RepositoryError>> + Send;

    /// Overwrite the terminal fields of a message and bump the parent
    /// conversation's `updated_at`. Returns `NotFound` if missing.
    fn update_message(
        &self,
        id: &Uuid,
        update: &MessageUpdate,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Every message of a conversation in insertion order.
    fn list_messages(
        &self,
        conversation_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Vec<Message>, RepositoryError>> + Send;

    /// The `limit` most recent messages of an owner's conversation, returned
    /// in insertion order, optionally leaving out one message.
    fn get_previous_messages(
        &self,
        conversation_id: &Uuid,
        clerk_id: &str,
        limit: u32,
        exclude: Option<&Uuid>,
    ) -> impl std::future::Future<Output = Result<Vec<Message>, RepositoryError>> + Send;

    /// All `image` messages of an owner, newest first.
    fn list_generated_images(
        &self,
        clerk_id: &str,
    ) -> impl std::future::Future<Output = Result<Vec<Message>, RepositoryError>> + Send;
}
