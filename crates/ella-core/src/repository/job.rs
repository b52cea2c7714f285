//! Job repository trait definition.
//!
//! Defines the storage interface for durable job runs and their step logs.
//! The infrastructure layer (ella-infra) implements this trait with SQLite
//! persistence.

use ella_types::error::RepositoryError;
use ella_types::job::{JobRun, JobRunStatus, StepLog};
use serde_json::Value;
use uuid::Uuid;

/// Repository trait for job run persistence.
///
/// Covers two entity families:
/// - **Runs:** Create/update/query job executions.
/// - **Steps:** Record and query per-step checkpoints, unique per
///   `(run_id, step_name)`.
///
/// Uses native async fn in traits (Rust 2024 edition, no async_trait macro).
pub trait JobRepository: Send + Sync {
    // -----------------------------------------------------------------------
    // Runs
    // -----------------------------------------------------------------------

    fn create_run(
        &self,
        run: &JobRun,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    fn get_run(
        &self,
        id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<JobRun>, RepositoryError>> + Send;

    /// Mark a run `running` and increment its attempt counter.
    /// Returns the new attempt number.
    fn start_attempt(
        &self,
        id: &Uuid,
    ) -> impl std::future::Future<Output = Result<u32, RepositoryError>> + Send;

    /// Set the run status. Terminal statuses also set `completed_at`.
    fn update_run_status(
        &self,
        id: &Uuid,
        status: JobRunStatus,
        error: Option<&str>,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// List runs, newest first, optionally filtered by status.
    fn list_runs(
        &self,
        status: Option<JobRunStatus>,
        limit: u32,
    ) -> impl std::future::Future<Output = Result<Vec<JobRun>, RepositoryError>> + Send;

    /// Runs left `queued` or `running`, oldest first.
    fn list_resumable_runs(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<JobRun>, RepositoryError>> + Send;

    // -----------------------------------------------------------------------
    // Steps
    // -----------------------------------------------------------------------

    fn get_step(
        &self,
        run_id: &Uuid,
        step_name: &str,
    ) -> impl std::future::Future<Output = Result<Option<StepLog>, RepositoryError>> + Send;

    /// Record a step as `running` for the given attempt, replacing any
    /// earlier failed record of the same step.
    fn start_step(
        &self,
        run_id: &Uuid,
        step_name: &str,
        attempt: u32,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    fn complete_step(
        &self,
        run_id: &Uuid,
        step_name: &str,
        output: &Value,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    fn fail_step(
        &self,
        run_id: &Uuid,
        step_name: &str,
        error: &str,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Step logs of a run in start order.
    fn list_steps(
        &self,
        run_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Vec<StepLog>, RepositoryError>> + Send;
}
