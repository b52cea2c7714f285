//! LLM provider implementations.
//!
//! Contains the OpenAI-compatible implementation of the [`LlmProvider`]
//! trait defined in `ella-core`, and [`create_provider`], which builds the
//! text provider from configuration.
//!
//! [`LlmProvider`]: ella_core::llm::provider::LlmProvider

pub mod openai_compat;

use secrecy::SecretString;

use ella_core::llm::box_provider::BoxLlmProvider;
use ella_types::config::ModelsConfig;
use ella_types::llm::LlmError;

use self::openai_compat::OpenAiCompatibleProvider;

/// Build the text-generation provider for the configured model.
///
/// # Errors
///
/// Returns [`LlmError::AuthenticationFailed`] when no API key is available.
pub fn create_provider(
    models: &ModelsConfig,
    api_key: Option<&SecretString>,
) -> Result<BoxLlmProvider, LlmError> {
    let api_key = api_key.ok_or(LlmError::AuthenticationFailed)?;
    let provider =
        OpenAiCompatibleProvider::gemini(api_key, &models.text_model, &models.text_base_url);
    tracing::debug!(
        model = %models.text_model,
        base_url = %models.text_base_url,
        "Text provider configured"
    );
    Ok(BoxLlmProvider::new(provider))
}
