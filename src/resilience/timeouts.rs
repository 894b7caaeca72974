//! Timeout enforcement.
//!
//! # Responsibilities
//! - Track elapsed time against the overall forwarding budget
//! - Derive each attempt's deadline from what is left of the budget
//!
//! # Design Decisions
//! - Uses Tokio's clock so paused-time tests drive it
//! - An attempt never gets more time than the budget has left
//! - Timed-out forwards return 504 Gateway Timeout

use std::time::Duration;

use tokio::time::Instant;

use crate::config::TimeoutConfig;

/// Elapsed-time bookkeeping for one forward.
#[derive(Debug, Clone, Copy)]
pub struct TimeBudget {
    started: Instant,
    overall: Duration,
    per_attempt: Duration,
}

impl TimeBudget {
    /// Start a budget now.
    pub fn start(overall: Duration, per_attempt: Duration) -> Self {
        Self::starting_at(Instant::now(), overall, per_attempt)
    }

    pub fn starting_at(started: Instant, overall: Duration, per_attempt: Duration) -> Self {
        Self {
            started,
            overall,
            per_attempt,
        }
    }

    pub fn from_config(config: &TimeoutConfig) -> Self {
        Self::start(
            Duration::from_millis(config.overall_ms),
            Duration::from_millis(config.attempt_ms),
        )
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Budget left, zero once exhausted.
    pub fn remaining(&self) -> Duration {
        self.overall.saturating_sub(self.elapsed())
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining().is_zero()
    }

    /// Deadline for the next attempt: the per-attempt limit capped by the remaining budget.
    pub fn attempt_deadline(&self) -> Duration {
        self.per_attempt.min(self.remaining())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn attempt_deadline_shrinks_with_budget() {
        let budget = TimeBudget::start(Duration::from_millis(3_000), Duration::from_millis(2_700));
        assert_eq!(budget.attempt_deadline(), Duration::from_millis(2_700));

        tokio::time::advance(Duration::from_millis(1_000)).await;
        assert_eq!(budget.remaining(), Duration::from_millis(2_000));
        assert_eq!(budget.attempt_deadline(), Duration::from_millis(2_000));

        tokio::time::advance(Duration::from_millis(5_000)).await;
        assert!(budget.is_exhausted());
        assert_eq!(budget.attempt_deadline(), Duration::ZERO);
    }
}
