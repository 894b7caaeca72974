//! Retry logic.
//!
//! # Responsibilities
//! - Decide whether a failed attempt may be retried
//!
//! # Design Decisions
//! - Only transient transport failures are retried
//! - A retry needs more than `margin` of the budget left
//! - Retries are immediate (no backoff) against the same target
//! - Bounded loop with an attempt cap, never recursion

use std::time::Duration;

use crate::config::{RetryConfig, TimeoutConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    margin: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, margin: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            margin,
        }
    }

    pub fn from_config(retries: &RetryConfig, timeouts: &TimeoutConfig) -> Self {
        Self::new(retries.max_attempts, Duration::from_millis(timeouts.retry_margin_ms))
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Whether another attempt should follow `attempts_made` failed ones.
    pub fn should_retry(&self, attempts_made: u32, transient: bool, remaining: Duration) -> bool {
        transient && attempts_made < self.max_attempts && remaining > self.margin
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default(), &TimeoutConfig::default())
    }
}
