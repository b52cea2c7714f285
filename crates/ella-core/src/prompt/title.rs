//! Conversation title generation via LLM.
//!
//! `generate_title` creates a 3-4 word headline for a conversation from its
//! messages.

use ella_types::llm::{CompletionRequest, LlmError};

use crate::llm::box_provider::BoxLlmProvider;

const TITLE_TEMPERATURE: f64 = 0.7;
const TITLE_TOP_P: f64 = 0.95;
const TITLE_MAX_TOKENS: u32 = 50;

/// Instruction preceding the conversation dump.
const TITLE_INSTRUCTION: &str = "You are a title generator. Your task is to create a short, meaningful, and attention-grabbing title of 3–4 words based on the overall context and key topics of the conversation.

Guidelines:
- The title must reflect the main theme or purpose of the conversation
- Keep it concise, relevant, and professional
- Avoid unnecessary words, punctuation, or filler terms
- Use title case (capitalize major words)
- The title should feel like a headline, not a full sentence
- No fluff, just the title we need

Conversation messages:
";

/// Build the single user turn sent to the model.
pub fn build_title_prompt(messages: &[serde_json::Value]) -> Result<String, serde_json::Error> {
    let dump = serde_json::to_string_pretty(messages)?;
    Ok(format!(
        "{TITLE_INSTRUCTION}{dump}\n\nGenerate only the title, nothing else:"
    ))
}

/// Generate a conversation title.
///
/// Returns `LlmError::EmptyResponse` when the model answers with nothing
/// but whitespace.
#[tracing::instrument(name = "generate_title", skip(provider, messages), fields(model = %model))]
pub async fn generate_title(
    provider: &BoxLlmProvider,
    model: &str,
    messages: &[serde_json::Value],
) -> Result<String, LlmError> {
    let prompt =
        build_title_prompt(messages).map_err(|e| LlmError::InvalidRequest(e.to_string()))?;

    let mut request = CompletionRequest::single_turn(model, None, prompt);
    request.temperature = Some(TITLE_TEMPERATURE);
    request.top_p = Some(TITLE_TOP_P);
    request.max_tokens = Some(TITLE_MAX_TOKENS);

    let response = provider.complete(&request).await?;
    let title = response.content.trim();
    if title.is_empty() {
        return Err(LlmError::EmptyResponse);
    }
    Ok(title.to_string())
}
