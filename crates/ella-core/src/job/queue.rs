//! Durable job queue.
//!
//! Enqueueing persists a `queued` run before the id is handed to the worker
//! channel. A full channel makes the caller wait for the worker; a run that
//! never reaches a worker (closed channel, crash) is picked up by
//! [`JobQueue::resume_pending`] on the next start.
//!
//! Each assistant message gets at most one run.

use ella_types::error::RepositoryError;
use ella_types::job::{GenerateResponseEvent, JobRun};
use tokio::sync::mpsc;
use uuid::Uuid;

use super::JobError;
use crate::repository::job::JobRepository;

pub struct JobQueue<J: JobRepository> {
    repo: J,
    tx: mpsc::Sender<Uuid>,
}

impl<J: JobRepository> JobQueue<J> {
    /// Create a queue and the receiving end the worker consumes.
    pub fn new(repo: J, capacity: usize) -> (Self, mpsc::Receiver<Uuid>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { repo, tx }, rx)
    }

    pub fn repo(&self) -> &J {
        &self.repo
    }

    /// Persist a run for `event` and hand it to the worker.
    ///
    /// Fails with [`JobError::AlreadyQueued`] when the target message
    /// already has a run.
    pub async fn enqueue(&self, event: &GenerateResponseEvent) -> Result<JobRun, JobError> {
        let run = JobRun::for_event(event).map_err(|e| JobError::Payload(e.to_string()))?;
        self.repo.create_run(&run).await.map_err(|e| match e {
            RepositoryError::Conflict(_) => JobError::AlreadyQueued(event.ai_message_id),
            other => other.into(),
        })?;
        self.dispatch(run.id).await;
        tracing::info!(
            run_id = %run.id,
            message_id = %event.ai_message_id,
            tool = %event.tool,
            "Response job enqueued"
        );
        Ok(run)
    }

    /// Re-dispatch every run left `queued` or `running`. Returns how many
    /// runs were handed to the worker.
    pub async fn resume_pending(&self) -> Result<usize, JobError> {
        let runs = self.repo.list_resumable_runs().await?;
        for run in &runs {
            tracing::info!(run_id = %run.id, status = %run.status, attempt = run.attempt, "Resuming job run");
            self.dispatch(run.id).await;
        }
        Ok(runs.len())
    }

    /// Waits while the channel is full.
    async fn dispatch(&self, run_id: Uuid) {
        if self.tx.send(run_id).await.is_err() {
            tracing::warn!(%run_id, "Worker stopped; run stays queued until restart");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::InMemoryJobs;
    use ella_types::job::{GENERATE_RESPONSE_EVENT, JobRunStatus};
    use ella_types::tool::Tool;

    fn event() -> GenerateResponseEvent {
        GenerateResponseEvent {
            message: "hello".to_string(),
            conversation_id: Uuid::now_v7(),
            clerk_id: "alice".to_string(),
            tool: Tool::Text,
            ai_message_id: Uuid::now_v7(),
            has_pro_plan: false,
        }
    }

    #[tokio::test]
    async fn test_enqueue_persists_then_dispatches() {
        let repo = InMemoryJobs::default();
        let (queue, mut rx) = JobQueue::new(repo.clone(), 8);

        let event = event();
        let run = queue.enqueue(&event).await.unwrap();

        assert_eq!(rx.recv().await, Some(run.id));
        let stored = repo.run(&run.id).unwrap();
        assert_eq!(stored.status, JobRunStatus::Queued);
        assert_eq!(stored.event, GENERATE_RESPONSE_EVENT);
        assert_eq!(stored.attempt, 0);
        assert_eq!(stored.event_payload().unwrap(), event);
    }

    #[tokio::test]
    async fn test_full_channel_delivers_every_run() {
        let repo = InMemoryJobs::default();
        let (queue, mut rx) = JobQueue::new(repo.clone(), 1);
        let producer = tokio::spawn(async move {
            let mut ids = Vec::new();
            for _ in 0..3 {
                ids.push(queue.enqueue(&event()).await.unwrap().id);
            }
            ids
        });

        let mut delivered = Vec::new();
        for _ in 0..3 {
            delivered.push(rx.recv().await.unwrap());
        }
        assert_eq!(producer.await.unwrap(), delivered);
    }

    #[tokio::test]
    async fn test_closed_channel_still_persists() {
        let repo = InMemoryJobs::default();
        let (queue, rx) = JobQueue::new(repo.clone(), 1);
        drop(rx);
        let run = queue.enqueue(&event()).await.unwrap();
        assert_eq!(repo.run(&run.id).unwrap().status, JobRunStatus::Queued);
    }

    #[tokio::test]
    async fn test_second_enqueue_for_same_message_is_rejected() {
        let repo = InMemoryJobs::default();
        let (queue, mut rx) = JobQueue::new(repo.clone(), 8);
        let event = event();
        let run = queue.enqueue(&event).await.unwrap();

        let err = queue.enqueue(&event).await.unwrap_err();
        assert!(matches!(err, JobError::AlreadyQueued(id) if id == event.ai_message_id));
        assert_eq!(rx.recv().await, Some(run.id));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_resume_pending_redispatches_unfinished_runs() {
        let repo = InMemoryJobs::default();
        let (queue, mut rx) = JobQueue::new(repo.clone(), 8);
        let a = queue.enqueue(&event()).await.unwrap();
        let b = queue.enqueue(&event()).await.unwrap();
        rx.recv().await;
        rx.recv().await;
        repo.update_run_status(&b.id, JobRunStatus::Completed, None)
            .await
            .unwrap();

        assert_eq!(queue.resume_pending().await.unwrap(), 1);
        assert_eq!(rx.recv().await, Some(a.id));
    }
}
