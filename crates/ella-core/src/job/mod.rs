//! Background response generation.
//!
//! - [`step`]: durable, replayable steps keyed by run id and step name
//! - [`generator`]: the tool router that runs one job attempt
//! - [`queue`] / [`worker`]: enqueueing and bounded concurrent execution

pub mod failure;
pub mod generator;
pub mod queue;
pub mod retry;
pub mod step;
pub mod worker;

use ella_types::error::RepositoryError;
use uuid::Uuid;

use self::step::StepError;

/// Errors from job bookkeeping (not from the work inside a job).
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("job repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("job run not found: {0}")]
    RunNotFound(Uuid),

    #[error("invalid job payload: {0}")]
    Payload(String),

    #[error("message {0} already has a job run")]
    AlreadyQueued(Uuid),

    /// The failure could not be written to the placeholder. The run stays
    /// resumable so the next start finishes it.
    #[error("terminal write failed: {0}")]
    TerminalWrite(StepError),
}
