//! GET /api/v1/library/images - every image the caller has generated.

use std::time::Instant;

use axum::Json;
use axum::extract::State;

use ella_types::conversation::Message;

use crate::http::error::AppError;
use crate::http::extractors::auth::CurrentUser;
use crate::http::response::ApiResponse;
use crate::state::AppState;

pub async fn list_images(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<ApiResponse<Vec<Message>>>, AppError> {
    let start = Instant::now();
    let images = state
        .conversation_service
        .list_generated_images(user.clerk_id())
        .await?;
    Ok(Json(ApiResponse::success(images, start)))
}
