//! Legacy chat endpoints.
//!
//! - POST /api/chat            - gate a tool request and enqueue generation
//! - POST /api/generate-title  - headline for a conversation
//!
//! Both answer with bare JSON (`{message}`, `{title}`, `{error}`) rather
//! than the `/api/v1` envelope.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use serde_json::{Value, json};
use tracing::Instrument;

use ella_core::chat::service::{ChatRequest, Dispatch};
use ella_core::prompt::title::generate_title;
use ella_observe::genai_attrs;

use crate::http::error::{AppError, LegacyError};
use crate::http::extractors::auth::CurrentUser;
use crate::state::AppState;

pub const TITLE_FAILED: &str = "Failed to generate title";
pub const MESSAGES_REQUIRED: &str = "Messages array is required";

/// POST /api/chat
///
/// Returns `200 {message}` both when the job was enqueued and when the
/// request was denied; a denial is reported through the placeholder.
pub async fn chat(
    State(state): State<AppState>,
    user: Result<CurrentUser, AppError>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<Value>, LegacyError> {
    let user = user?;
    let Json(request) =
        body.map_err(|e| LegacyError::new(StatusCode::BAD_REQUEST, e.body_text()))?;

    let message = request.message.clone();
    match state
        .chat_service
        .dispatch(&user.caller(), request)
        .await
        .map_err(AppError::from)?
    {
        Dispatch::Enqueued(run) => {
            tracing::info!(run_id = %run.id, clerk_id = user.clerk_id(), "Generation enqueued");
        }
        Dispatch::Denied => {
            tracing::info!(clerk_id = user.clerk_id(), "Generation denied");
        }
    }

    Ok(Json(json!({ "message": message })))
}

/// POST /api/generate-title
pub async fn generate_conversation_title(
    State(state): State<AppState>,
    user: Result<CurrentUser, AppError>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, LegacyError> {
    user?;
    let messages = body
        .ok()
        .and_then(|Json(body)| body.get("messages").and_then(Value::as_array).cloned())
        .ok_or_else(|| LegacyError::new(StatusCode::BAD_REQUEST, MESSAGES_REQUIRED))?;

    let model = &state.config.models.text_model;
    let span = tracing::info_span!(
        "gen_ai.title",
        gen_ai.operation.name = genai_attrs::OP_GENERATE_TITLE,
        gen_ai.request.model = %model,
        messages = messages.len(),
    );

    let title = generate_title(&state.llm, model, &messages)
        .instrument(span)
        .await
        .map_err(|e| {
            tracing::warn!(error = %e, "Title generation failed");
            LegacyError::new(StatusCode::INTERNAL_SERVER_ERROR, TITLE_FAILED)
        })?;

    Ok(Json(json!({ "title": title })))
}
