//! Caller profile endpoints.
//!
//! - GET  /api/v1/users/me - the caller's record
//! - POST /api/v1/users/me - get-or-create the caller's record

use std::time::Instant;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use serde::Serialize;

use ella_types::user::{User, UserProfile};

use crate::http::error::AppError;
use crate::http::extractors::auth::CurrentUser;
use crate::http::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct UserRecord {
    pub user: User,
    pub created: bool,
}

pub async fn get_me(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<ApiResponse<User>>, AppError> {
    let start = Instant::now();
    let user = state.user_service.get_user(user.clerk_id()).await?;
    Ok(Json(ApiResponse::success(user, start)))
}

/// The body is an optional profile; an absent or empty body means defaults.
pub async fn ensure_me(
    State(state): State<AppState>,
    user: CurrentUser,
    body: Result<Json<UserProfile>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<UserRecord>>), AppError> {
    let start = Instant::now();
    let profile = match body {
        Ok(Json(profile)) => profile,
        Err(JsonRejection::MissingJsonContentType(_)) => UserProfile::default(),
        Err(e) => return Err(AppError::Validation(e.body_text())),
    };

    let (user, created) = state
        .user_service
        .get_or_create_user(user.clerk_id(), profile)
        .await?;
    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(ApiResponse::success(UserRecord { user, created }, start))))
}
