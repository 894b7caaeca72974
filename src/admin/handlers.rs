//! Admin endpoint handlers.
//!
//! Read-only views of the registry and health tracker, plus the
//! administrative health reset.

use std::collections::BTreeMap;

use axum::{extract::State, Json};
use serde::Serialize;

use crate::health::HealthState;
use crate::http::server::AppState;
use crate::load_balancer::Strategy;

#[derive(Debug, Serialize)]
pub struct HealthReport {
    /// `healthy` while at least one backend is healthy, else `degraded`.
    pub status: &'static str,
    pub developers: Vec<String>,
    pub strategy: Strategy,
    pub request_counts: BTreeMap<String, u64>,
    pub health_status: BTreeMap<String, HealthState>,
}

#[derive(Debug, Serialize)]
pub struct BalancerReport {
    pub strategy: Strategy,
    pub available_strategies: Vec<Strategy>,
    pub request_counts: BTreeMap<String, u64>,
    pub health_status: BTreeMap<String, HealthState>,
    pub developers: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ResetReport {
    pub status: &'static str,
    pub health_status: BTreeMap<String, HealthState>,
}

struct Snapshot {
    developers: Vec<String>,
    request_counts: BTreeMap<String, u64>,
    health_status: BTreeMap<String, HealthState>,
}

fn snapshot(state: &AppState) -> Snapshot {
    let router = &state.router;
    let health = router.health().snapshot();
    let developers: Vec<String> = router
        .registry()
        .list_backends()
        .into_iter()
        .map(str::to_string)
        .collect();

    let mut request_counts = BTreeMap::new();
    let mut health_status = BTreeMap::new();
    for id in &developers {
        let record = health.get(id).cloned().unwrap_or_default();
        request_counts.insert(id.clone(), record.request_count);
        health_status.insert(id.clone(), record.state);
    }

    Snapshot {
        developers,
        request_counts,
        health_status,
    }
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> Json<HealthReport> {
    let snapshot = snapshot(&state);
    let any_healthy = snapshot
        .health_status
        .values()
        .any(|s| *s == HealthState::Healthy);

    Json(HealthReport {
        status: if any_healthy { "healthy" } else { "degraded" },
        developers: snapshot.developers,
        strategy: state.router.strategy(),
        request_counts: snapshot.request_counts,
        health_status: snapshot.health_status,
    })
}

/// `GET /load-balancer`
pub async fn load_balancer(State(state): State<AppState>) -> Json<BalancerReport> {
    let snapshot = snapshot(&state);
    Json(BalancerReport {
        strategy: state.router.strategy(),
        available_strategies: Strategy::ALL.to_vec(),
        request_counts: snapshot.request_counts,
        health_status: snapshot.health_status,
        developers: snapshot.developers,
    })
}

/// `POST /reset-health`
pub async fn reset_health(State(state): State<AppState>) -> Json<ResetReport> {
    let health_status = state.router.health().reset_all().into_iter().collect();
    Json(ResetReport {
        status: "reset",
        health_status,
    })
}
