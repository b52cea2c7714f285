//! SQLite job repository: durable runs and per-step checkpoints.

use ella_core::repository::job::JobRepository;
use ella_types::error::RepositoryError;
use ella_types::job::{JobRun, JobRunStatus, StepLog, StepStatus};
use serde_json::Value;
use sqlx::Row;
use uuid::Uuid;

use super::pool::DatabasePool;
use super::{format_datetime, parse_datetime, query_error};

#[derive(Clone)]
pub struct SqliteJobRepository {
    pool: DatabasePool,
}

impl SqliteJobRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

struct JobRunRow {
    id: String,
    event: String,
    message_id: String,
    payload: String,
    status: String,
    attempt: i64,
    error: Option<String>,
    created_at: String,
    updated_at: String,
    completed_at: Option<String>,
}

impl JobRunRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            event: row.try_get("event")?,
            message_id: row.try_get("message_id")?,
            payload: row.try_get("payload")?,
            status: row.try_get("status")?,
            attempt: row.try_get("attempt")?,
            error: row.try_get("error")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            completed_at: row.try_get("completed_at")?,
        })
    }

    fn into_run(self) -> Result<JobRun, RepositoryError> {
        Ok(JobRun {
            id: Uuid::parse_str(&self.id)
                .map_err(|e| RepositoryError::Query(format!("invalid run id: {e}")))?,
            event: self.event,
            message_id: Uuid::parse_str(&self.message_id)
                .map_err(|e| RepositoryError::Query(format!("invalid message id: {e}")))?,
            payload: serde_json::from_str(&self.payload)
                .map_err(|e| RepositoryError::Query(format!("invalid run payload: {e}")))?,
            status: self.status.parse().map_err(RepositoryError::Query)?,
            attempt: attempt_from_db(self.attempt)?,
            error: self.error,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
            completed_at: self.completed_at.as_deref().map(parse_datetime).transpose()?,
        })
    }
}

struct StepLogRow {
    id: String,
    run_id: String,
    step_name: String,
    status: String,
    attempt: i64,
    output: Option<String>,
    error: Option<String>,
    started_at: String,
    completed_at: Option<String>,
}

impl StepLogRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            run_id: row.try_get("run_id")?,
            step_name: row.try_get("step_name")?,
            status: row.try_get("status")?,
            attempt: row.try_get("attempt")?,
            output: row.try_get("output")?,
            error: row.try_get("error")?,
            started_at: row.try_get("started_at")?,
            completed_at: row.try_get("completed_at")?,
        })
    }

    fn into_step(self) -> Result<StepLog, RepositoryError> {
        let output = self
            .output
            .as_deref()
            .map(serde_json::from_str::<Value>)
            .transpose()
            .map_err(|e| RepositoryError::Query(format!("invalid step output: {e}")))?;
        Ok(StepLog {
            id: Uuid::parse_str(&self.id)
                .map_err(|e| RepositoryError::Query(format!("invalid step id: {e}")))?,
            run_id: Uuid::parse_str(&self.run_id)
                .map_err(|e| RepositoryError::Query(format!("invalid run_id: {e}")))?,
            step_name: self.step_name,
            status: self.status.parse().map_err(RepositoryError::Query)?,
            attempt: attempt_from_db(self.attempt)?,
            output,
            error: self.error,
            started_at: parse_datetime(&self.started_at)?,
            completed_at: self.completed_at.as_deref().map(parse_datetime).transpose()?,
        })
    }
}

fn collect_runs(rows: &[sqlx::sqlite::SqliteRow]) -> Result<Vec<JobRun>, RepositoryError> {
    rows.iter()
        .map(|row| JobRunRow::from_row(row).map_err(query_error)?.into_run())
        .collect()
}

fn attempt_from_db(attempt: i64) -> Result<u32, RepositoryError> {
    u32::try_from(attempt)
        .map_err(|_| RepositoryError::Query(format!("attempt out of range: {attempt}")))
}

fn now() -> String {
    format_datetime(&chrono::Utc::now())
}

impl JobRepository for SqliteJobRepository {
    async fn create_run(&self, run: &JobRun) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"INSERT INTO job_runs (id, event, message_id, payload, status, attempt, error, created_at, updated_at, completed_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(run.id.to_string())
        .bind(&run.event)
        .bind(run.message_id.to_string())
        .bind(run.payload.to_string())
        .bind(run.status.to_string())
        .bind(i64::from(run.attempt))
        .bind(&run.error)
        .bind(format_datetime(&run.created_at))
        .bind(format_datetime(&run.updated_at))
        .bind(run.completed_at.as_ref().map(format_datetime))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.message().contains("UNIQUE")
            {
                return RepositoryError::Conflict(format!(
                    "message {} already has a job run",
                    run.message_id
                ));
            }
            query_error(e)
        })?;
        Ok(())
    }

    async fn get_run(&self, id: &Uuid) -> Result<Option<JobRun>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM job_runs WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_error)?;
        row.map(|row| JobRunRow::from_row(&row).map_err(query_error)?.into_run())
            .transpose()
    }

    async fn start_attempt(&self, id: &Uuid) -> Result<u32, RepositoryError> {
        let attempt: Option<i64> = sqlx::query_scalar(
            "UPDATE job_runs SET attempt = attempt + 1, status = 'running', updated_at = ?
             WHERE id = ? RETURNING attempt",
        )
        .bind(now())
        .bind(id.to_string())
        .fetch_optional(&self.pool.writer)
        .await
        .map_err(query_error)?;
        attempt
            .ok_or(RepositoryError::NotFound)
            .and_then(attempt_from_db)
    }

    async fn update_run_status(
        &self,
        id: &Uuid,
        status: JobRunStatus,
        error: Option<&str>,
    ) -> Result<(), RepositoryError> {
        let now = now();
        let completed_at = matches!(status, JobRunStatus::Completed | JobRunStatus::Failed)
            .then(|| now.clone());
        let result = sqlx::query(
            "UPDATE job_runs SET status = ?, error = ?, updated_at = ?, completed_at = ? WHERE id = ?",
        )
        .bind(status.to_string())
        .bind(error)
        .bind(&now)
        .bind(completed_at)
        .bind(id.to_string())
        .execute(&self.pool.writer)
        .await
        .map_err(query_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn list_runs(
        &self,
        status: Option<JobRunStatus>,
        limit: u32,
    ) -> Result<Vec<JobRun>, RepositoryError> {
        let rows = match status {
            Some(status) => {
                sqlx::query(
                    "SELECT * FROM job_runs WHERE status = ? ORDER BY created_at DESC LIMIT ?",
                )
                .bind(status.to_string())
                .bind(i64::from(limit))
                .fetch_all(&self.pool.reader)
                .await
            }
            None => {
                sqlx::query("SELECT * FROM job_runs ORDER BY created_at DESC LIMIT ?")
                    .bind(i64::from(limit))
                    .fetch_all(&self.pool.reader)
                    .await
            }
        }
        .map_err(query_error)?;
        collect_runs(&rows)
    }

    async fn list_resumable_runs(&self) -> Result<Vec<JobRun>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT * FROM job_runs WHERE status IN ('queued', 'running') ORDER BY created_at ASC",
        )
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_error)?;
        collect_runs(&rows)
    }

    async fn get_step(&self, run_id: &Uuid, step_name: &str) -> Result<Option<StepLog>, RepositoryError> {
        // Read through the writer so a step completed a moment ago is
        // always visible to the replay check.
        let row = sqlx::query("SELECT * FROM job_steps WHERE run_id = ? AND step_name = ?")
            .bind(run_id.to_string())
            .bind(step_name)
            .fetch_optional(&self.pool.writer)
            .await
            .map_err(query_error)?;
        row.map(|row| StepLogRow::from_row(&row).map_err(query_error)?.into_step())
            .transpose()
    }

    async fn start_step(&self, run_id: &Uuid, step_name: &str, attempt: u32) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"INSERT INTO job_steps (id, run_id, step_name, status, attempt, output, error, started_at, completed_at)
               VALUES (?, ?, ?, 'running', ?, NULL, NULL, ?, NULL)
               ON CONFLICT (run_id, step_name) DO UPDATE SET
                   status = 'running', attempt = excluded.attempt, output = NULL,
                   error = NULL, started_at = excluded.started_at, completed_at = NULL"#,
        )
        .bind(Uuid::now_v7().to_string())
        .bind(run_id.to_string())
        .bind(step_name)
        .bind(i64::from(attempt))
        .bind(now())
        .execute(&self.pool.writer)
        .await
        .map_err(query_error)?;
        Ok(())
    }

    async fn complete_step(&self, run_id: &Uuid, step_name: &str, output: &Value) -> Result<(), RepositoryError> {
        self.finish_step(run_id, step_name, StepStatus::Completed, Some(output.to_string()), None)
            .await
    }

    async fn fail_step(&self, run_id: &Uuid, step_name: &str, error: &str) -> Result<(), RepositoryError> {
        self.finish_step(run_id, step_name, StepStatus::Failed, None, Some(error))
            .await
    }

    async fn list_steps(&self, run_id: &Uuid) -> Result<Vec<StepLog>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM job_steps WHERE run_id = ? ORDER BY started_at ASC")
            .bind(run_id.to_string())
            .fetch_all(&self.pool.reader)
            .await
            .map_err(query_error)?;
        rows.iter()
            .map(|row| StepLogRow::from_row(row).map_err(query_error)?.into_step())
            .collect()
    }
}

impl SqliteJobRepository {
    async fn finish_step(
        &self,
        run_id: &Uuid,
        step_name: &str,
        status: StepStatus,
        output: Option<String>,
        error: Option<&str>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE job_steps SET status = ?, output = ?, error = ?, completed_at = ?
             WHERE run_id = ? AND step_name = ?",
        )
        .bind(status.to_string())
        .bind(output)
        .bind(error)
        .bind(now())
        .bind(run_id.to_string())
        .bind(step_name)
        .execute(&self.pool.writer)
        .await
        .map_err(query_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
