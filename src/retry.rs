//! Retry policy for image generation calls.
//!
//! A request gets at most `max_attempts` upstream calls. Before every call
//! after the first, the caller sleeps for an exponentially growing delay:
//!
//! - Attempt 1: no delay
//! - Attempt 2: `initial_backoff_ms` (2s by default)
//! - Attempt 3: twice that (4s)
//! - ... capped at `max_backoff_ms`
//!
//! Nothing sleeps after the final attempt.
//!
//! ```yaml
//! generation:
//!   retry:
//!     max_attempts: 3
//!     initial_backoff_ms: 2000
//!     max_backoff_ms: 8000
//! ```

use crate::constants::{DEFAULT_INITIAL_BACKOFF_MS, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_BACKOFF_MS};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of upstream calls, including the first one
    pub max_attempts: u32,
    /// Delay before the first retry in milliseconds
    pub initial_backoff_ms: u64,
    /// Cap for the exponential growth in milliseconds
    pub max_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_backoff_ms: DEFAULT_INITIAL_BACKOFF_MS,
            max_backoff_ms: DEFAULT_MAX_BACKOFF_MS,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, initial_backoff_ms: u64, max_backoff_ms: u64) -> Self {
        Self {
            max_attempts,
            initial_backoff_ms,
            max_backoff_ms,
        }
    }

    /// Delay before the call with 0-based index `attempt` (0 = first call).
    pub fn backoff_duration(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }

        // initial_backoff * 2^(attempt-1)
        let backoff_ms = self
            .initial_backoff_ms
            .saturating_mul(2u64.saturating_pow(attempt - 1))
            .min(self.max_backoff_ms);

        Duration::from_millis(backoff_ms)
    }

    /// Whether another call may follow the failed call with index `attempt`.
    pub fn should_retry(&self, attempt: u32, retryable: bool) -> bool {
        retryable && attempt.saturating_add(1) < self.max_attempts
    }
}
