//! OpenTelemetry GenAI semantic-convention names used on model-call spans.
//!
//! Span fields are written as dotted literals (`gen_ai.request.model = ..`)
//! since `tracing` field names must be tokens; these constants are the
//! canonical spellings those literals follow, plus the values Ella records.

pub const GEN_AI_OPERATION_NAME: &str = "gen_ai.operation.name";
pub const GEN_AI_PROVIDER_NAME: &str = "gen_ai.provider.name";
pub const GEN_AI_REQUEST_MODEL: &str = "gen_ai.request.model";
pub const GEN_AI_REQUEST_TEMPERATURE: &str = "gen_ai.request.temperature";
pub const GEN_AI_REQUEST_MAX_TOKENS: &str = "gen_ai.request.max_tokens";
pub const GEN_AI_USAGE_INPUT_TOKENS: &str = "gen_ai.usage.input_tokens";
pub const GEN_AI_USAGE_OUTPUT_TOKENS: &str = "gen_ai.usage.output_tokens";
pub const GEN_AI_RESPONSE_FINISH_REASONS: &str = "gen_ai.response.finish_reasons";

// --- Operation name values ---

/// Chat completion (web answers and plain text replies).
pub const OP_CHAT: &str = "chat";

/// Conversation title generation.
pub const OP_GENERATE_TITLE: &str = "generate_title";

/// Structured image-parameter extraction.
pub const OP_EXTRACT_IMAGE_PROPERTIES: &str = "extract_image_properties";

/// Text-to-image generation.
pub const OP_GENERATE_IMAGE: &str = "generate_image";
