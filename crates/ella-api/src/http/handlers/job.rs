//! GET /api/v1/jobs/{id} - a job run and its step log.
//!
//! Runs belong to the user named in their payload; anyone else gets 404.

use std::time::Instant;

use axum::Json;
use axum::extract::{Path, State};
use serde::Serialize;

use ella_core::job::JobError;
use ella_core::repository::job::JobRepository;
use ella_types::job::{JobRun, StepLog};

use super::parse_uuid;
use crate::http::error::AppError;
use crate::http::extractors::auth::CurrentUser;
use crate::http::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct JobDetail {
    pub run: JobRun,
    pub steps: Vec<StepLog>,
}

pub async fn get_job(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<JobDetail>>, AppError> {
    let start = Instant::now();
    let id = parse_uuid(&id)?;

    let run = state
        .jobs
        .get_run(&id)
        .await
        .map_err(JobError::from)?
        .filter(|run| {
            run.event_payload()
                .map(|event| event.clerk_id == user.clerk_id())
                .unwrap_or(false)
        })
        .ok_or(JobError::RunNotFound(id))?;
    let steps = state.jobs.list_steps(&id).await.map_err(JobError::from)?;

    Ok(Json(ApiResponse::success(JobDetail { run, steps }, start)))
}
