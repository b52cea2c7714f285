//! Conversation service enforcing ownership over every operation.
//!
//! ConversationService wraps a `ConversationRepository` and is the only way
//! the HTTP layer touches conversations: each call takes the caller's
//! identity and refuses to act on someone else's thread.

use ella_types::conversation::{Conversation, Message};
use ella_types::error::ConversationError;
use ella_types::tool::ToolDirective;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::repository::conversation::ConversationRepository;

/// Result of submitting a raw user turn.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedTurn {
    pub user_message: Message,
    /// Pending assistant placeholder the background job will complete.
    pub placeholder: Message,
    pub directive: ToolDirective,
}

/// Owner-checked conversation and message operations.
pub struct ConversationService<C: ConversationRepository> {
    repo: C,
}

impl<C: ConversationRepository> ConversationService<C> {
    pub fn new(repo: C) -> Self {
        Self { repo }
    }

    pub fn repo(&self) -> &C {
        &self.repo
    }

    // --- Conversations ---

    /// Create an empty conversation with the placeholder title.
    pub async fn create_conversation(
        &self,
        clerk_id: &str,
    ) -> Result<Conversation, ConversationError> {
        let conversation = Conversation::new(clerk_id);
        self.repo.create_conversation(&conversation).await?;
        info!(conversation_id = %conversation.id, "Conversation created");
        Ok(conversation)
    }

    pub async fn list_conversations(
        &self,
        clerk_id: &str,
    ) -> Result<Vec<Conversation>, ConversationError> {
        Ok(self.repo.list_conversations(clerk_id).await?)
    }

    /// Fetch a conversation the caller owns.
    ///
    /// `NotFound` if it does not exist, `Forbidden` if someone else owns it.
    pub async fn get_conversation(
        &self,
        clerk_id: &str,
        id: &Uuid,
    ) -> Result<Conversation, ConversationError> {
        let conversation = self
            .repo
            .get_conversation(id)
            .await?
            .ok_or(ConversationError::NotFound)?;
        if !conversation.is_owned_by(clerk_id) {
            return Err(ConversationError::Forbidden);
        }
        Ok(conversation)
    }

    pub async fn rename_conversation(
        &self,
        clerk_id: &str,
        id: &Uuid,
        title: &str,
    ) -> Result<Conversation, ConversationError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(ConversationError::InvalidInput(
                "title must not be empty".to_string(),
            ));
        }
        self.get_conversation(clerk_id, id).await?;
        self.repo.update_conversation_title(id, title).await?;
        info!(conversation_id = %id, "Conversation renamed");
        self.get_conversation(clerk_id, id).await
    }

    /// Delete a conversation and all its messages.
    pub async fn delete_conversation(
        &self,
        clerk_id: &str,
        id: &Uuid,
    ) -> Result<(), ConversationError> {
        self.get_conversation(clerk_id, id).await?;
        if !self.repo.delete_conversation(id).await? {
            return Err(ConversationError::NotFound);
        }
        info!(conversation_id = %id, "Conversation deleted");
        Ok(())
    }

    /// Conversations whose title or any message text contains `term`,
    /// ignoring case.
    pub async fn search_conversations(
        &self,
        clerk_id: &str,
        term: &str,
    ) -> Result<Vec<Conversation>, ConversationError> {
        Ok(self.repo.search_conversations(clerk_id, term).await?)
    }

    // --- Messages ---

    pub async fn list_messages(
        &self,
        clerk_id: &str,
        conversation_id: &Uuid,
    ) -> Result<Vec<Message>, ConversationError> {
        self.get_conversation(clerk_id, conversation_id).await?;
        Ok(self.repo.list_messages(conversation_id).await?)
    }

    /// Every image the caller has generated, newest first.
    pub async fn list_generated_images(
        &self,
        clerk_id: &str,
    ) -> Result<Vec<Message>, ConversationError> {
        Ok(self.repo.list_generated_images(clerk_id).await?)
    }

    /// Store a raw user turn and its pending assistant placeholder.
    ///
    /// The input is classified here, once. The user message keeps the raw
    /// text; the placeholder carries the selected tool as its type. Both
    /// rows exist before anything else happens for this turn.
    pub async fn submit_turn(
        &self,
        clerk_id: &str,
        conversation_id: &Uuid,
        raw: &str,
    ) -> Result<SubmittedTurn, ConversationError> {
        if raw.trim().is_empty() {
            return Err(ConversationError::InvalidInput(
                "message must not be empty".to_string(),
            ));
        }
        self.get_conversation(clerk_id, conversation_id).await?;

        let directive = ToolDirective::classify(raw);
        let user_message = Message::user(clerk_id, *conversation_id, raw);
        self.repo.create_message(&user_message).await?;

        let placeholder = Message::placeholder(clerk_id, *conversation_id, directive.tool);
        self.repo.create_message(&placeholder).await?;

        info!(
            conversation_id = %conversation_id,
            message_id = %placeholder.id,
            tool = %directive.tool,
            "User turn submitted"
        );

        Ok(SubmittedTurn {
            user_message,
            placeholder,
            directive,
        })
    }
}
