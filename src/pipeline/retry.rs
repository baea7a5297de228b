//! Retry policy for failed searches.

use std::time::Duration;

use crate::error::AppError;
use crate::models::SchedulerConfig;

/// Decides whether a failed search is attempted again.
///
/// Only transport failures are retried. A missed search string is tolerable
/// because overlapping strings usually reach the same vessels, so the default
/// policy makes a single attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: usize,
    delay: Duration,
}

impl RetryPolicy {
    /// Single attempt, no retries.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            delay: Duration::ZERO,
        }
    }

    /// Up to `max_attempts` attempts with a fixed `delay` in between.
    pub fn new(max_attempts: usize, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    pub fn from_config(config: &SchedulerConfig) -> Self {
        Self::new(
            config.retry_attempts,
            Duration::from_millis(config.retry_delay_ms),
        )
    }

    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    /// Delay before the next attempt, or `None` to give up.
    ///
    /// `attempts` is the number of attempts already made.
    pub fn next_delay(&self, attempts: usize, error: &AppError) -> Option<Duration> {
        if attempts >= self.max_attempts {
            return None;
        }
        match error {
            AppError::Network(_) => Some(self.delay),
            _ => None,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}
