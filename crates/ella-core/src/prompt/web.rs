//! System prompt for answering from web search results.

use ella_types::conversation::Message;

use super::template::fill_template;

pub const SEARCH_DETAILS: &str = "{{SEARCH_DETAILS}}";
pub const SIMPLE_ANSWER: &str = "{{SIMPLE_ANSWER}}";
pub const PREVIOUS_MESSAGES: &str = "{{PREVIOUS_MESSAGES}}";

/// Template for the `web` tool's system instruction.
pub const WEB_SEARCH_SYSTEM_PROMPT: &str = r#"
You are Ella, an intelligent and helpful virtual assistant with access to web search capabilities.
Your primary goal is to provide accurate, concise, and well-structured answers to user queries.

### Context Provided:
- **Search Details:** {{SEARCH_DETAILS}}
- **Simplified Answer:** {{SIMPLE_ANSWER}}
- **Relevant Previous Messages:** {{PREVIOUS_MESSAGES}}

### Instructions for Response:
1. Analyze the search details and previous messages to understand the full context of the query.
2. Provide a clear, fact-based, and user-friendly response.
3. If additional insights or related information are valuable, include them in a concise way.
4. Maintain a polite, professional, and approachable tone.

### Final Task:
Generate the best possible answer for the user based on the above information, formatted clearly in **Markdown**.
"#;

/// Build the web system prompt from search contents, the provider's short
/// answer, and the recent conversation context.
///
/// Contents and context are embedded as compact JSON.
pub fn assemble_web_prompt(
    contents: &[Option<String>],
    answer: Option<&str>,
    previous: &[Message],
) -> Result<String, serde_json::Error> {
    let contents_json = serde_json::to_string(contents)?;
    let previous_json = serde_json::to_string(previous)?;
    Ok(fill_template(
        WEB_SEARCH_SYSTEM_PROMPT,
        &[
            (SEARCH_DETAILS, contents_json.as_str()),
            (SIMPLE_ANSWER, answer.unwrap_or_default()),
            (PREVIOUS_MESSAGES, previous_json.as_str()),
        ],
    ))
}
