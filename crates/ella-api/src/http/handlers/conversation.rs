//! Conversation and message HTTP handlers.
//!
//! Endpoints:
//! - POST   /api/v1/conversations                 - Create a conversation
//! - GET    /api/v1/conversations                 - List, most recent first
//! - GET    /api/v1/conversations/search?q=       - Search titles and messages
//! - GET    /api/v1/conversations/{id}            - Get one conversation
//! - PATCH  /api/v1/conversations/{id}            - Rename
//! - DELETE /api/v1/conversations/{id}            - Delete with its messages
//! - GET    /api/v1/conversations/{id}/messages   - List messages
//! - POST   /api/v1/conversations/{id}/messages   - Submit a user turn

use std::time::Instant;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::Deserialize;

use ella_core::conversation::service::SubmittedTurn;
use ella_types::conversation::{Conversation, Message};

use super::parse_uuid;
use crate::http::error::AppError;
use crate::http::extractors::auth::CurrentUser;
use crate::http::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Deserialize)]
pub struct RenameRequest {
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct SubmitTurnRequest {
    pub message: String,
}

/// POST /api/v1/conversations
pub async fn create_conversation(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<(StatusCode, Json<ApiResponse<Conversation>>), AppError> {
    let start = Instant::now();
    let conversation = state
        .conversation_service
        .create_conversation(user.clerk_id())
        .await?;
    let href = format!("/api/v1/conversations/{}", conversation.id);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(conversation, start).with_link("self", &href)),
    ))
}

/// GET /api/v1/conversations
pub async fn list_conversations(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<ApiResponse<Vec<Conversation>>>, AppError> {
    let start = Instant::now();
    let conversations = state
        .conversation_service
        .list_conversations(user.clerk_id())
        .await?;
    Ok(Json(
        ApiResponse::success(conversations, start).with_link("self", "/api/v1/conversations"),
    ))
}

/// GET /api/v1/conversations/search?q=
///
/// An empty or missing `q` lists every conversation of the caller.
pub async fn search_conversations(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<SearchQuery>,
) -> Result<Json<ApiResponse<Vec<Conversation>>>, AppError> {
    let start = Instant::now();
    let conversations = state
        .conversation_service
        .search_conversations(user.clerk_id(), &query.q)
        .await?;
    Ok(Json(ApiResponse::success(conversations, start)))
}

/// GET /api/v1/conversations/{id}
pub async fn get_conversation(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Conversation>>, AppError> {
    let start = Instant::now();
    let id = parse_uuid(&id)?;
    let conversation = state
        .conversation_service
        .get_conversation(user.clerk_id(), &id)
        .await?;
    Ok(Json(
        ApiResponse::success(conversation, start)
            .with_link("messages", &format!("/api/v1/conversations/{id}/messages")),
    ))
}

/// PATCH /api/v1/conversations/{id}
pub async fn rename_conversation(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(body): Json<RenameRequest>,
) -> Result<Json<ApiResponse<Conversation>>, AppError> {
    let start = Instant::now();
    let id = parse_uuid(&id)?;
    let conversation = state
        .conversation_service
        .rename_conversation(user.clerk_id(), &id, &body.title)
        .await?;
    Ok(Json(ApiResponse::success(conversation, start)))
}

/// DELETE /api/v1/conversations/{id}
pub async fn delete_conversation(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_uuid(&id)?;
    state
        .conversation_service
        .delete_conversation(user.clerk_id(), &id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/conversations/{id}/messages
pub async fn list_messages(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Vec<Message>>>, AppError> {
    let start = Instant::now();
    let id = parse_uuid(&id)?;
    let messages = state
        .conversation_service
        .list_messages(user.clerk_id(), &id)
        .await?;
    Ok(Json(ApiResponse::success(messages, start)))
}

/// POST /api/v1/conversations/{id}/messages
///
/// Stores the user message and a pending placeholder. The client follows
/// up with `POST /api/chat` carrying the placeholder id.
pub async fn submit_turn(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(body): Json<SubmitTurnRequest>,
) -> Result<(StatusCode, Json<ApiResponse<SubmittedTurn>>), AppError> {
    let start = Instant::now();
    let id = parse_uuid(&id)?;
    let turn = state
        .conversation_service
        .submit_turn(user.clerk_id(), &id, &body.message)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(turn, start).with_link("chat", "/api/chat")),
    ))
}
