//! Background job types: the response-generation event, durable job runs,
//! and per-step execution logs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::tool::Tool;

/// Name of the event that triggers assistant response generation.
pub const GENERATE_RESPONSE_EVENT: &str = "chat/generate-ai-response";

/// Payload of a `chat/generate-ai-response` job.
///
/// The tool was classified at submission time and is trusted as-is; the
/// plan flag is carried for the record, never re-checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponseEvent {
    pub message: String,
    pub conversation_id: Uuid,
    pub clerk_id: String,
    pub tool: Tool,
    #[serde(rename = "AIMessageId")]
    pub ai_message_id: Uuid,
    pub has_pro_plan: bool,
}

// ---------------------------------------------------------------------------
// Job Run
// ---------------------------------------------------------------------------

/// Overall status of a job run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobRunStatus {
    Queued,
    Running,
    Completed,
    Failed,
}

impl JobRunStatus {
    /// Runs in these states are picked up again after a restart.
    pub fn is_resumable(self) -> bool {
        matches!(self, JobRunStatus::Queued | JobRunStatus::Running)
    }
}

impl fmt::Display for JobRunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobRunStatus::Queued => write!(f, "queued"),
            JobRunStatus::Running => write!(f, "running"),
            JobRunStatus::Completed => write!(f, "completed"),
            JobRunStatus::Failed => write!(f, "failed"),
        }
    }
}

impl FromStr for JobRunStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "queued" => Ok(JobRunStatus::Queued),
            "running" => Ok(JobRunStatus::Running),
            "completed" => Ok(JobRunStatus::Completed),
            "failed" => Ok(JobRunStatus::Failed),
            other => Err(format!("invalid job run status: '{other}'")),
        }
    }
}

/// A durable execution of one background job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRun {
    /// UUIDv7 run ID.
    pub id: Uuid,
    /// Event that created the run.
    pub event: String,
    /// Assistant placeholder the run resolves. At most one run exists per
    /// message.
    pub message_id: Uuid,
    /// JSON event payload.
    pub payload: serde_json::Value,
    pub status: JobRunStatus,
    /// Number of attempts started so far (1-based once running).
    pub attempt: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl JobRun {
    /// A freshly queued run for the response-generation event.
    pub fn for_event(event: &GenerateResponseEvent) -> Result<Self, serde_json::Error> {
        let now = Utc::now();
        Ok(Self {
            id: Uuid::now_v7(),
            event: GENERATE_RESPONSE_EVENT.to_string(),
            message_id: event.ai_message_id,
            payload: serde_json::to_value(event)?,
            status: JobRunStatus::Queued,
            attempt: 0,
            error: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
        })
    }

    /// Decode the payload back into the response-generation event.
    pub fn event_payload(&self) -> Result<GenerateResponseEvent, serde_json::Error> {
        serde_json::from_value(self.payload.clone())
    }
}

// ---------------------------------------------------------------------------
// Step Log
// ---------------------------------------------------------------------------

/// Status of one step within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Running,
    Completed,
    Failed,
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepStatus::Running => write!(f, "running"),
            StepStatus::Completed => write!(f, "completed"),
            StepStatus::Failed => write!(f, "failed"),
        }
    }
}

impl FromStr for StepStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "running" => Ok(StepStatus::Running),
            "completed" => Ok(StepStatus::Completed),
            "failed" => Ok(StepStatus::Failed),
            other => Err(format!("invalid step status: '{other}'")),
        }
    }
}

/// Checkpoint record of a single step. Unique per (run_id, step_name).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepLog {
    /// UUIDv7 step log ID.
    pub id: Uuid,
    pub run_id: Uuid,
    pub step_name: String,
    pub status: StepStatus,
    /// Attempt number of the run that last touched this step.
    pub attempt: u32,
    /// JSON output, replayed verbatim once the step has completed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Retry Configuration
// ---------------------------------------------------------------------------

/// Retry policy applied to a whole job run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts (default 3).
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Base delay between attempts; doubled on each retry.
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff_ms() -> u64 {
    1000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_ms: default_backoff_ms(),
        }
    }
}
