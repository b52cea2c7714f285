//! Tool router and response generator.
//!
//! One call to [`ResponseGenerator::generate`] is one attempt of a
//! `chat/generate-ai-response` job. It fetches recent context, dispatches on
//! the tool carried in the event, and finishes by writing the assistant
//! placeholder. Every external call and every write is a named step, so a
//! later attempt skips whatever already succeeded.
//!
//! ```text
//! get-previous-messages
//!   web:   web-search -> assemble-web-prompt -> generate-web-response -> save-web-response
//!   image: extract-image-properties -> generate-image -> save-image
//!   text:  generate-text-response -> save-text-response
//! ```

use std::sync::Arc;

use ella_types::conversation::{Message, MessageUpdate};
use ella_types::image::{ImageError, ImageGenerationRequest, ImageProperties};
use ella_types::job::GenerateResponseEvent;
use ella_types::llm::CompletionRequest;
use ella_types::search::{SearchRequest, SearchResponse};
use ella_types::tool::Tool;

use super::failure::{MISSING_IMAGE_PROMPT_MESSAGE, humanize_error};
use super::step::{StepError, StepRunner};
use crate::llm::box_provider::BoxLlmProvider;
use crate::prompt::image::{IMAGE_PROPERTIES_PROMPT, parse_image_properties};
use crate::prompt::persona::ELLA_PERSONA_PROMPT;
use crate::prompt::web::assemble_web_prompt;
use crate::provider::image::ImageGenerator;
use crate::provider::search::WebSearchProvider;
use crate::repository::conversation::ConversationRepository;
use crate::repository::job::JobRepository;

pub const GET_PREVIOUS_MESSAGES: &str = "get-previous-messages";
pub const WEB_SEARCH: &str = "web-search";
pub const ASSEMBLE_WEB_PROMPT: &str = "assemble-web-prompt";
pub const GENERATE_WEB_RESPONSE: &str = "generate-web-response";
pub const SAVE_WEB_RESPONSE: &str = "save-web-response";
pub const EXTRACT_IMAGE_PROPERTIES: &str = "extract-image-properties";
pub const GENERATE_IMAGE: &str = "generate-image";
pub const SAVE_IMAGE: &str = "save-image";
pub const GENERATE_TEXT_RESPONSE: &str = "generate-text-response";
pub const SAVE_TEXT_RESPONSE: &str = "save-text-response";
pub const MARK_FAILED: &str = "mark-failed";

/// Models and limits used by the generator.
#[derive(Debug, Clone)]
pub struct GeneratorSettings {
    pub text_model: String,
    pub image_model: String,
    /// Prior messages fetched as short-term memory.
    pub context_window: u32,
}

/// Executes the response-generation workflow against injected providers.
pub struct ResponseGenerator<C, S, I>
where
    C: ConversationRepository,
    S: WebSearchProvider,
    I: ImageGenerator,
{
    conversations: C,
    llm: Arc<BoxLlmProvider>,
    search: S,
    images: I,
    settings: GeneratorSettings,
}

impl<C, S, I> ResponseGenerator<C, S, I>
where
    C: ConversationRepository,
    S: WebSearchProvider,
    I: ImageGenerator,
{
    pub fn new(
        conversations: C,
        llm: Arc<BoxLlmProvider>,
        search: S,
        images: I,
        settings: GeneratorSettings,
    ) -> Self {
        Self {
            conversations,
            llm,
            search,
            images,
            settings,
        }
    }

    /// Run one attempt of the workflow. Returns the update that was written
    /// to the placeholder.
    #[tracing::instrument(
        name = "generate_response",
        skip_all,
        fields(
            run_id = %steps.run_id(),
            attempt = steps.attempt(),
            message_id = %event.ai_message_id,
            tool = %event.tool,
        )
    )]
    pub async fn generate<J: JobRepository>(
        &self,
        steps: &StepRunner<'_, J>,
        event: &GenerateResponseEvent,
    ) -> Result<MessageUpdate, StepError> {
        let previous: Vec<Message> = steps
            .run(GET_PREVIOUS_MESSAGES, || {
                self.conversations.get_previous_messages(
                    &event.conversation_id,
                    &event.clerk_id,
                    self.settings.context_window,
                    Some(&event.ai_message_id),
                )
            })
            .await?;

        match event.tool {
            Tool::Web => self.web(steps, event, &previous).await,
            Tool::Image => self.image(steps, event).await,
            Tool::Text => self.text(steps, event).await,
        }
    }

    /// Write the terminal failure for a job that ran out of attempts.
    pub async fn mark_failed<J: JobRepository>(
        &self,
        steps: &StepRunner<'_, J>,
        event: &GenerateResponseEvent,
        error: &StepError,
    ) -> Result<MessageUpdate, StepError> {
        let update = MessageUpdate::failed(event.tool, humanize_error(&error.detail()));
        self.save(steps, MARK_FAILED, event, &update).await?;
        Ok(update)
    }

    // -----------------------------------------------------------------------
    // Branches
    // -----------------------------------------------------------------------

    async fn web<J: JobRepository>(
        &self,
        steps: &StepRunner<'_, J>,
        event: &GenerateResponseEvent,
        previous: &[Message],
    ) -> Result<MessageUpdate, StepError> {
        let search: SearchResponse = steps
            .run(WEB_SEARCH, || async {
                let request = SearchRequest::full(event.message.clone());
                self.search.search(&request).await
            })
            .await?;

        let prompt: String = steps
            .run(ASSEMBLE_WEB_PROMPT, || async {
                assemble_web_prompt(&search.contents(), search.answer.as_deref(), previous)
            })
            .await?;

        let text: String = steps
            .run(GENERATE_WEB_RESPONSE, || async {
                let request = CompletionRequest::single_turn(
                    &self.settings.text_model,
                    Some(prompt.clone()),
                    event.message.clone(),
                );
                self.llm.complete(&request).await.map(|r| r.content)
            })
            .await?;

        let update =
            MessageUpdate::completed_web(text, search.resources(), search.image_results());
        self.save(steps, SAVE_WEB_RESPONSE, event, &update).await?;
        Ok(update)
    }

    async fn image<J: JobRepository>(
        &self,
        steps: &StepRunner<'_, J>,
        event: &GenerateResponseEvent,
    ) -> Result<MessageUpdate, StepError> {
        let properties: ImageProperties = steps
            .run(EXTRACT_IMAGE_PROPERTIES, || async {
                if event.message.trim().is_empty() {
                    return Ok(ImageProperties::not_found());
                }
                let request = CompletionRequest::single_turn(
                    &self.settings.text_model,
                    Some(IMAGE_PROPERTIES_PROMPT.to_string()),
                    event.message.clone(),
                );
                let response = self.llm.complete(&request).await.map_err(|e| e.to_string())?;
                parse_image_properties(&response.content)
                    .map_err(|e| format!("malformed image properties: {e}"))
            })
            .await?;

        if properties.is_not_found() {
            tracing::info!(message_id = %event.ai_message_id, "image request has no prompt");
            let update = MessageUpdate::failed(Tool::Image, MISSING_IMAGE_PROMPT_MESSAGE);
            self.save(steps, SAVE_IMAGE, event, &update).await?;
            return Ok(update);
        }

        let url: String = steps
            .run(GENERATE_IMAGE, || async {
                let request =
                    ImageGenerationRequest::from_properties(&self.settings.image_model, &properties);
                let urls = self.images.generate(&request).await?;
                urls.into_iter().next().ok_or(ImageError::NoImage)
            })
            .await?;

        let update = MessageUpdate::completed_image(url);
        self.save(steps, SAVE_IMAGE, event, &update).await?;
        Ok(update)
    }

    async fn text<J: JobRepository>(
        &self,
        steps: &StepRunner<'_, J>,
        event: &GenerateResponseEvent,
    ) -> Result<MessageUpdate, StepError> {
        let text: String = steps
            .run(GENERATE_TEXT_RESPONSE, || async {
                let request = CompletionRequest::single_turn(
                    &self.settings.text_model,
                    Some(ELLA_PERSONA_PROMPT.to_string()),
                    event.message.clone(),
                );
                self.llm.complete(&request).await.map(|r| r.content)
            })
            .await?;

        let update = MessageUpdate::completed_text(text);
        self.save(steps, SAVE_TEXT_RESPONSE, event, &update).await?;
        Ok(update)
    }

    async fn save<J: JobRepository>(
        &self,
        steps: &StepRunner<'_, J>,
        step: &str,
        event: &GenerateResponseEvent,
        update: &MessageUpdate,
    ) -> Result<(), StepError> {
        steps
            .run(step, || {
                self.conversations
                    .update_message(&event.ai_message_id, update)
            })
            .await
    }
}
