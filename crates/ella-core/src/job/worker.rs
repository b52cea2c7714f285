//! Background worker executing response-generation runs.
//!
//! The worker consumes run ids from the queue channel and executes each run
//! on its own task, bounded by a semaphore. A run is retried as a whole with
//! exponential backoff; completed steps replay from the step log. When the
//! retry budget is spent the placeholder is marked failed exactly once.

use std::sync::Arc;

use ella_types::job::{JobRun, JobRunStatus, RetryConfig};
use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::JobError;
use super::generator::ResponseGenerator;
use super::retry::RetryHandler;
use super::step::{StepError, StepRunner};
use crate::provider::image::ImageGenerator;
use crate::provider::search::WebSearchProvider;
use crate::repository::conversation::ConversationRepository;
use crate::repository::job::JobRepository;

/// Step name recorded when a run is found with its attempts already used up
/// (a crash during the final attempt).
const ATTEMPTS_EXHAUSTED: &str = "attempts-exhausted";

pub struct JobWorker<C, S, I, J>
where
    C: ConversationRepository,
    S: WebSearchProvider,
    I: ImageGenerator,
    J: JobRepository,
{
    generator: Arc<ResponseGenerator<C, S, I>>,
    jobs: J,
    retry: RetryConfig,
    semaphore: Arc<Semaphore>,
    cancel: CancellationToken,
}

impl<C, S, I, J> JobWorker<C, S, I, J>
where
    C: ConversationRepository + 'static,
    S: WebSearchProvider + 'static,
    I: ImageGenerator + 'static,
    J: JobRepository + 'static,
{
    pub fn new(
        generator: Arc<ResponseGenerator<C, S, I>>,
        jobs: J,
        retry: RetryConfig,
        concurrency: usize,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            generator,
            jobs,
            retry,
            semaphore: Arc::new(Semaphore::new(concurrency.max(1))),
            cancel,
        }
    }

    /// Consume run ids until the channel closes or the worker is cancelled.
    pub fn spawn(self: Arc<Self>, mut rx: mpsc::Receiver<Uuid>) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                let run_id = tokio::select! {
                    _ = self.cancel.cancelled() => break,
                    next = rx.recv() => match next {
                        Some(id) => id,
                        None => break,
                    },
                };

                let permit = tokio::select! {
                    _ = self.cancel.cancelled() => break,
                    permit = self.semaphore.clone().acquire_owned() => match permit {
                        Ok(p) => p,
                        Err(_) => break,
                    },
                };

                let worker = Arc::clone(&self);
                tokio::spawn(async move {
                    let _permit = permit;
                    if let Err(e) = worker.execute_run(run_id).await {
                        tracing::error!(%run_id, error = %e, "Job run aborted");
                    }
                });
            }
            tracing::info!("Job worker stopped");
        })
    }

    /// Execute a run to a terminal state (or until cancelled between
    /// attempts). Runs that are already terminal are left untouched.
    #[tracing::instrument(name = "job_run", skip(self))]
    pub async fn execute_run(&self, run_id: Uuid) -> Result<JobRunStatus, JobError> {
        let run = self
            .jobs
            .get_run(&run_id)
            .await?
            .ok_or(JobError::RunNotFound(run_id))?;
        if !run.status.is_resumable() {
            tracing::debug!(status = %run.status, "Run already finished");
            return Ok(run.status);
        }

        let event = match run.event_payload() {
            Ok(event) => event,
            Err(e) => {
                let message = format!("undecodable payload: {e}");
                self.jobs
                    .update_run_status(&run_id, JobRunStatus::Failed, Some(&message))
                    .await?;
                return Err(JobError::Payload(message));
            }
        };

        loop {
            let attempt = self.jobs.start_attempt(&run_id).await?;
            let steps = StepRunner::new(&self.jobs, run_id, attempt);

            if attempt > self.retry.max_attempts {
                let error = exhausted_error(&run);
                return self.finish_failed(&steps, &event, &error).await;
            }

            tracing::debug!(attempt, "Starting attempt");
            match self.generator.generate(&steps, &event).await {
                Ok(_) => {
                    self.jobs
                        .update_run_status(&run_id, JobRunStatus::Completed, None)
                        .await?;
                    tracing::info!(attempt, "Job run completed");
                    return Ok(JobRunStatus::Completed);
                }
                Err(e) if RetryHandler::should_retry(&self.retry, attempt) => {
                    let delay = RetryHandler::backoff(&self.retry, attempt);
                    tracing::warn!(attempt, step = e.step(), error = %e, ?delay, "Attempt failed, retrying");
                    self.jobs
                        .update_run_status(&run_id, JobRunStatus::Queued, Some(&e.to_string()))
                        .await?;
                    tokio::select! {
                        _ = tokio::time::sleep(delay) => {}
                        _ = self.cancel.cancelled() => {
                            tracing::info!("Worker cancelled; run left queued");
                            return Ok(JobRunStatus::Queued);
                        }
                    }
                }
                Err(e) => {
                    return self.finish_failed(&steps, &event, &e).await;
                }
            }
        }
    }

    async fn finish_failed(
        &self,
        steps: &StepRunner<'_, J>,
        event: &ella_types::job::GenerateResponseEvent,
        error: &StepError,
    ) -> Result<JobRunStatus, JobError> {
        tracing::error!(step = error.step(), error = %error, "Job run failed");
        if let Err(e) = self.generator.mark_failed(steps, event, error).await {
            // Left `running`: resume_pending retries the terminal write.
            tracing::error!(error = %e, "Could not mark placeholder failed");
            return Err(JobError::TerminalWrite(e));
        }
        self.jobs
            .update_run_status(&steps.run_id(), JobRunStatus::Failed, Some(&error.to_string()))
            .await?;
        Ok(JobRunStatus::Failed)
    }
}

fn exhausted_error(run: &JobRun) -> StepError {
    StepError::Failed {
        step: ATTEMPTS_EXHAUSTED.to_string(),
        message: run
            .error
            .clone()
            .unwrap_or_else(|| "job interrupted after its final attempt".to_string()),
    }
}
