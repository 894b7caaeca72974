//! Backend health state machine.
//!
//! # States
//! - Healthy: backend receives traffic
//! - Unhealthy: backend excluded from selection
//!
//! # State Transitions
//! ```text
//! Healthy → Unhealthy: consecutive transient failures >= failure_threshold
//! Healthy → Unhealthy: any permanent failure (connection refused)
//! Unhealthy → Healthy: any successful forward, or administrative reset
//! ```

use serde::Serialize;

/// Health State enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthState {
    #[default]
    Healthy,
    Unhealthy,
}

/// Per-backend health record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackendHealth {
    pub state: HealthState,
    /// Consecutive transient failures since the last success or reset.
    pub consecutive_failures: u32,
    /// Successful forwards since process start. Never decremented.
    pub request_count: u64,
}

impl BackendHealth {
    pub fn is_healthy(&self) -> bool {
        self.state == HealthState::Healthy
    }

    /// Record a successful forward. Returns true if the backend recovered.
    pub fn mark_success(&mut self) -> bool {
        let recovered = self.state == HealthState::Unhealthy;
        self.state = HealthState::Healthy;
        self.consecutive_failures = 0;
        self.request_count += 1;
        recovered
    }

    /// Record a failed forward. Returns true if the backend just became unhealthy.
    pub fn mark_failure(&mut self, transient: bool, failure_threshold: u32) -> bool {
        let was_healthy = self.is_healthy();
        if transient {
            self.consecutive_failures = self.consecutive_failures.saturating_add(1);
            if self.consecutive_failures >= failure_threshold {
                self.state = HealthState::Unhealthy;
            }
        } else {
            self.state = HealthState::Unhealthy;
        }
        was_healthy && !self.is_healthy()
    }

    /// Administrative reset. Leaves the request count alone.
    pub fn reset(&mut self) {
        self.state = HealthState::Healthy;
        self.consecutive_failures = 0;
    }
}
