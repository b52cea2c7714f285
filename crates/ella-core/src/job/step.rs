//! Durable step execution.
//!
//! A job is a sequence of named steps. Each step's outcome is persisted in
//! the step log keyed by `(run_id, step_name)`:
//!
//! - before the step runs, its log entry is marked `running`;
//! - on success the JSON-serialized output is stored and the entry is
//!   marked `completed`;
//! - on failure the error text is stored and the entry is marked `failed`.
//!
//! When a run is retried (or resumed after a crash) a step whose entry is
//! already `completed` is not executed again: its stored output is decoded
//! and returned instead. Only steps after the last completed one do work.

use std::fmt::Display;
use std::future::Future;

use serde::Serialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use ella_types::error::RepositoryError;
use ella_types::job::StepStatus;

use crate::repository::job::JobRepository;

/// Errors raised while running a step.
#[derive(Debug, thiserror::Error)]
pub enum StepError {
    /// The step's own work failed.
    #[error("step '{step}' failed: {message}")]
    Failed { step: String, message: String },

    /// The step log could not be read or written.
    #[error("step log error in '{step}': {source}")]
    Checkpoint {
        step: String,
        #[source]
        source: RepositoryError,
    },

    /// A step output could not be stored or replayed.
    #[error("step '{step}' output could not be (de)serialized: {message}")]
    Output { step: String, message: String },
}

impl StepError {
    pub fn step(&self) -> &str {
        match self {
            StepError::Failed { step, .. }
            | StepError::Checkpoint { step, .. }
            | StepError::Output { step, .. } => step,
        }
    }

    /// The underlying error text, without the step prefix.
    pub fn detail(&self) -> String {
        match self {
            StepError::Failed { message, .. } | StepError::Output { message, .. } => {
                message.clone()
            }
            StepError::Checkpoint { source, .. } => source.to_string(),
        }
    }
}

/// Runs named steps for one attempt of one job run.
pub struct StepRunner<'a, J: JobRepository> {
    repo: &'a J,
    run_id: Uuid,
    attempt: u32,
}

impl<'a, J: JobRepository> StepRunner<'a, J> {
    pub fn new(repo: &'a J, run_id: Uuid, attempt: u32) -> Self {
        Self {
            repo,
            run_id,
            attempt,
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Run `work` as the step `name`, or replay its stored output if the
    /// step already completed in an earlier attempt.
    pub async fn run<T, E, F, Fut>(&self, name: &str, work: F) -> Result<T, StepError>
    where
        T: Serialize + DeserializeOwned,
        E: Display,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let checkpoint = |source| StepError::Checkpoint {
            step: name.to_string(),
            source,
        };
        let output_error = |e: serde_json::Error| StepError::Output {
            step: name.to_string(),
            message: e.to_string(),
        };

        if let Some(log) = self
            .repo
            .get_step(&self.run_id, name)
            .await
            .map_err(checkpoint)?
        {
            if log.status == StepStatus::Completed {
                tracing::debug!(run_id = %self.run_id, step = name, "replaying completed step");
                let stored = log.output.unwrap_or(serde_json::Value::Null);
                return serde_json::from_value(stored).map_err(output_error);
            }
        }

        self.repo
            .start_step(&self.run_id, name, self.attempt)
            .await
            .map_err(checkpoint)?;
        tracing::debug!(run_id = %self.run_id, step = name, attempt = self.attempt, "step started");

        match work().await {
            Ok(value) => {
                let stored = serde_json::to_value(&value).map_err(output_error)?;
                self.repo
                    .complete_step(&self.run_id, name, &stored)
                    .await
                    .map_err(checkpoint)?;
                tracing::debug!(run_id = %self.run_id, step = name, "step completed");
                Ok(value)
            }
            Err(e) => {
                let message = e.to_string();
                self.repo
                    .fail_step(&self.run_id, name, &message)
                    .await
                    .map_err(checkpoint)?;
                tracing::warn!(run_id = %self.run_id, step = name, error = %message, "step failed");
                Err(StepError::Failed {
                    step: name.to_string(),
                    message,
                })
            }
        }
    }
}
