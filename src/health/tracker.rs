//! Passive health tracking from forward outcomes.
//!
//! # Responsibilities
//! - Observe forward outcomes reported by the router
//! - Track consecutive failures and per-backend request counts
//! - Trigger state transitions on threshold breach
//!
//! # Design Decisions
//! - Only transport failures count; any upstream status code is a success
//! - One mutex guards the whole map so read-modify-write is atomic
//! - The lock is never held across I/O

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::health::state::{BackendHealth, HealthState};
use crate::load_balancer::backend::normalize;

/// Shared health and request-count state for every backend.
#[derive(Debug)]
pub struct HealthTracker {
    backends: Mutex<HashMap<String, BackendHealth>>,
    failure_threshold: u32,
}

impl HealthTracker {
    /// Create a tracker that knows `ids` up front, all healthy.
    pub fn new<'a, I>(ids: I, failure_threshold: u32) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let backends = ids
            .into_iter()
            .map(|id| (normalize(id), BackendHealth::default()))
            .collect();
        Self {
            backends: Mutex::new(backends),
            failure_threshold: failure_threshold.max(1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, BackendHealth>> {
        // A panic while holding this lock cannot leave a record half-written,
        // so a poisoned map is still usable.
        self.backends.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn failure_threshold(&self) -> u32 {
        self.failure_threshold
    }

    /// Unknown ids are healthy.
    pub fn is_healthy(&self, backend_id: &str) -> bool {
        self.lock()
            .get(&normalize(backend_id))
            .map_or(true, BackendHealth::is_healthy)
    }

    pub fn request_count(&self, backend_id: &str) -> u64 {
        self.lock()
            .get(&normalize(backend_id))
            .map_or(0, |h| h.request_count)
    }

    /// Health record for a backend (default record for unknown ids).
    pub fn get(&self, backend_id: &str) -> BackendHealth {
        self.lock()
            .get(&normalize(backend_id))
            .cloned()
            .unwrap_or_default()
    }

    /// Copy of every record, taken under a single lock.
    pub fn snapshot(&self) -> HashMap<String, BackendHealth> {
        self.lock().clone()
    }

    pub fn report_success(&self, backend_id: &str) {
        let id = normalize(backend_id);
        let recovered = self.lock().entry(id.clone()).or_default().mark_success();
        if recovered {
            tracing::info!(backend = %id, "Backend recovered, marked healthy");
        }
    }

    pub fn report_failure(&self, backend_id: &str, transient: bool) {
        let id = normalize(backend_id);
        let (tripped, failures) = {
            let mut backends = self.lock();
            let health = backends.entry(id.clone()).or_default();
            let tripped = health.mark_failure(transient, self.failure_threshold);
            (tripped, health.consecutive_failures)
        };

        if tripped {
            tracing::warn!(
                backend = %id,
                transient,
                consecutive_failures = failures,
                "Backend marked unhealthy"
            );
        } else {
            tracing::debug!(backend = %id, transient, consecutive_failures = failures, "Backend failure recorded");
        }
    }

    /// Mark every known backend healthy with a zero failure counter.
    pub fn reset_all(&self) -> HashMap<String, HealthState> {
        let mut backends = self.lock();
        for health in backends.values_mut() {
            health.reset();
        }
        tracing::info!(backends = backends.len(), "Health reset for all backends");
        backends.iter().map(|(id, h)| (id.clone(), h.state)).collect()
    }
}
