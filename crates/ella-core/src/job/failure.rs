//! Human-readable failure text for assistant messages.
//!
//! Provider errors are never shown verbatim. A quota or rate-limit problem
//! gets a dedicated notice, a provider error carrying a JSON body with
//! `error.message` shows that message, and everything else gets a generic
//! apology.

use serde_json::Value;

pub const QUOTA_EXCEEDED_MESSAGE: &str = "You've exceeded your daily quota for AI requests. Please try again tomorrow or upgrade your plan.";

pub const GENERIC_FAILURE_MESSAGE: &str =
    "Something went wrong while generating a response. Please try again.";

/// Text written to the placeholder when an image request has no prompt.
pub const MISSING_IMAGE_PROMPT_MESSAGE: &str =
    "Please describe the image you want me to generate, for example `/image a red fox in snow`.";

/// Translate raw error text into what the user sees.
pub fn humanize_error(raw: &str) -> String {
    if let Some(body) = embedded_json(raw) {
        let error = &body["error"];
        if error["code"].as_u64() == Some(429) {
            return QUOTA_EXCEEDED_MESSAGE.to_string();
        }
        if let Some(message) = error["message"].as_str().filter(|m| !m.trim().is_empty()) {
            if is_quota_text(message) {
                return QUOTA_EXCEEDED_MESSAGE.to_string();
            }
            return message.to_string();
        }
    }
    if is_quota_text(raw) {
        return QUOTA_EXCEEDED_MESSAGE.to_string();
    }
    GENERIC_FAILURE_MESSAGE.to_string()
}

fn is_quota_text(text: &str) -> bool {
    let lower = text.to_lowercase();
    lower.contains("quota") || lower.contains("429") || lower.contains("rate limited")
}

/// The first JSON object embedded in `raw` that has an `error` field.
fn embedded_json(raw: &str) -> Option<Value> {
    raw.match_indices('{').find_map(|(idx, _)| {
        let mut stream = serde_json::Deserializer::from_str(&raw[idx..]).into_iter::<Value>();
        match stream.next() {
            Some(Ok(value)) if value.get("error").is_some() => Some(value),
            _ => None,
        }
    })
}
