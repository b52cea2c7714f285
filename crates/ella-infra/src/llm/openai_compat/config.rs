//! Configuration for OpenAI-compatible chat completion endpoints.

use secrecy::SecretString;

/// Default Gemini OpenAI-compatible endpoint.
pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai";

/// Configuration for an [`super::OpenAiCompatibleProvider`].
pub struct OpenAiCompatConfig {
    /// Provider name reported in logs and spans (e.g. "gemini").
    pub provider_name: String,
    pub base_url: String,
    pub api_key: SecretString,
    /// Model used when a request leaves `model` empty.
    pub model: String,
}

/// Gemini through its OpenAI-compatible endpoint. An empty `base_url`
/// selects [`GEMINI_BASE_URL`].
pub fn gemini_defaults(api_key: &SecretString, model: &str, base_url: &str) -> OpenAiCompatConfig {
    let base_url = if base_url.trim().is_empty() {
        GEMINI_BASE_URL
    } else {
        base_url.trim_end_matches('/')
    };
    OpenAiCompatConfig {
        provider_name: "gemini".into(),
        base_url: base_url.into(),
        api_key: api_key.clone(),
        model: model.into(),
    }
}
