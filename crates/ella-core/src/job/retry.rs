//! Retry policy for job runs.
//!
//! Stateless: all logic lives in associated functions that take the
//! configuration as a parameter. A failed attempt is retried as a whole;
//! completed steps replay from the step log, so a retry only redoes the
//! step that failed and the ones after it.

use std::time::Duration;

use ella_types::job::RetryConfig;

/// Upper bound on the exponent applied to the base backoff.
const MAX_BACKOFF_DOUBLINGS: u32 = 6;

pub struct RetryHandler;

impl RetryHandler {
    /// Whether another attempt should follow a failed `attempt`.
    ///
    /// `attempt` is 1-based (first execution is attempt 1).
    pub fn should_retry(config: &RetryConfig, attempt: u32) -> bool {
        attempt < config.max_attempts
    }

    /// Delay before the attempt following `attempt`: the base backoff
    /// doubled once per earlier retry.
    pub fn backoff(config: &RetryConfig, attempt: u32) -> Duration {
        let doublings = attempt.saturating_sub(1).min(MAX_BACKOFF_DOUBLINGS);
        Duration::from_millis(config.backoff_ms.saturating_mul(1u64 << doublings))
    }
}
