//! Chat dispatch: gate a generation request, then enqueue or deny.
//!
//! The placeholder named by the request must already exist, belong to the
//! caller, sit in the named conversation and still be pending. A denied
//! request resolves that placeholder right away and never creates a job.
//! An admitted request creates the placeholder's only job; a repeat while
//! that job is still running is rejected as not pending.

use ella_types::conversation::{MessageSender, MessageStatus, MessageUpdate};
use ella_types::error::ConversationError;
use ella_types::job::{GenerateResponseEvent, JobRun};
use ella_types::tool::Tool;
use serde::Deserialize;
use uuid::Uuid;

use super::gate::{Admission, UPGRADE_NOTICE, admit};
use crate::job::JobError;
use crate::job::queue::JobQueue;
use crate::repository::conversation::ConversationRepository;
use crate::repository::job::JobRepository;

/// The authenticated caller as far as chat dispatch is concerned.
#[derive(Debug, Clone)]
pub struct Caller {
    pub clerk_id: String,
    pub has_pro_plan: bool,
}

/// Body of a generation request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub message: String,
    pub conversation_id: Uuid,
    #[serde(default)]
    pub tool: Tool,
    #[serde(rename = "AIMessageId")]
    pub ai_message_id: Uuid,
}

#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error(transparent)]
    Conversation(#[from] ConversationError),

    #[error("message {0} is not a pending assistant message")]
    NotPending(Uuid),

    #[error(transparent)]
    Job(#[from] JobError),
}

#[derive(Debug, Clone)]
pub enum Dispatch {
    Enqueued(JobRun),
    Denied,
}

pub struct ChatService<C: ConversationRepository, J: JobRepository> {
    conversations: C,
    queue: JobQueue<J>,
}

impl<C: ConversationRepository, J: JobRepository> ChatService<C, J> {
    pub fn new(conversations: C, queue: JobQueue<J>) -> Self {
        Self {
            conversations,
            queue,
        }
    }

    pub fn queue(&self) -> &JobQueue<J> {
        &self.queue
    }

    #[tracing::instrument(
        skip_all,
        fields(message_id = %request.ai_message_id, tool = %request.tool)
    )]
    pub async fn dispatch(
        &self,
        caller: &Caller,
        request: ChatRequest,
    ) -> Result<Dispatch, SubmissionError> {
        self.check_placeholder(caller, &request).await?;

        if admit(request.tool, caller.has_pro_plan) == Admission::Denied {
            let update = MessageUpdate::failed(Tool::Text, UPGRADE_NOTICE);
            self.conversations
                .update_message(&request.ai_message_id, &update)
                .await
                .map_err(ConversationError::from)?;
            tracing::info!("Tool request denied for free plan");
            return Ok(Dispatch::Denied);
        }

        let event = GenerateResponseEvent {
            message: request.message,
            conversation_id: request.conversation_id,
            clerk_id: caller.clerk_id.clone(),
            tool: request.tool,
            ai_message_id: request.ai_message_id,
            has_pro_plan: caller.has_pro_plan,
        };
        let run = self.queue.enqueue(&event).await.map_err(|e| match e {
            JobError::AlreadyQueued(id) => SubmissionError::NotPending(id),
            other => other.into(),
        })?;
        Ok(Dispatch::Enqueued(run))
    }

    async fn check_placeholder(
        &self,
        caller: &Caller,
        request: &ChatRequest,
    ) -> Result<(), SubmissionError> {
        let conversation = self
            .conversations
            .get_conversation(&request.conversation_id)
            .await
            .map_err(ConversationError::from)?
            .ok_or(ConversationError::NotFound)?;
        if !conversation.is_owned_by(&caller.clerk_id) {
            return Err(ConversationError::Forbidden.into());
        }

        let placeholder = self
            .conversations
            .get_message(&request.ai_message_id)
            .await
            .map_err(ConversationError::from)?
            .ok_or(ConversationError::MessageNotFound)?;
        if placeholder.clerk_id != caller.clerk_id
            || placeholder.conversation_id != request.conversation_id
        {
            return Err(ConversationError::Forbidden.into());
        }
        if placeholder.sender != MessageSender::Assistant
            || placeholder.status != MessageStatus::Pending
        {
            return Err(SubmissionError::NotPending(placeholder.id));
        }
        Ok(())
    }
}
