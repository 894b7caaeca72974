//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define router metrics (requests, latency, retries, health)
//! - Expose a Prometheus-compatible scrape endpoint
//! - Track per-backend and per-service metrics
//!
//! # Metrics
//! - `router_requests_total` (counter): requests by service, status, backend
//! - `router_request_duration_seconds` (histogram): end-to-end latency
//! - `router_backend_health` (gauge): 1=healthy, 0=unhealthy
//! - `router_retries_total` (counter): retried attempts by upstream host
//! - `router_duplicates_total` (counter): suppressed duplicate deliveries
//! - `router_no_backend_total` (counter): requests answered 503
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   recorder every call is a no-op
//! - Buckets stop just past the overall forward budget

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder};

const LATENCY_BUCKETS: &[f64] = &[0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.0, 2.7, 3.0, 5.0];

/// Install the Prometheus recorder and its HTTP scrape listener on `addr`.
///
/// Must run inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .set_buckets_for_metric(
            Matcher::Full("router_request_duration_seconds".to_string()),
            LATENCY_BUCKETS,
        )?
        .install()?;

    describe_counter!("router_requests_total", "Total webhook requests handled");
    describe_histogram!(
        "router_request_duration_seconds",
        "End-to-end request duration in seconds"
    );
    describe_gauge!("router_backend_health", "Backend health (1=healthy, 0=unhealthy)");
    describe_counter!("router_retries_total", "Forward attempts retried after a transient failure");
    describe_counter!("router_duplicates_total", "Duplicate deliveries answered without forwarding");
    describe_counter!("router_no_backend_total", "Requests with no eligible backend");

    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record a completed request.
pub fn record_request(service: &str, status: u16, backend: &str, start: Instant) {
    counter!(
        "router_requests_total",
        "service" => service.to_string(),
        "status" => status.to_string(),
        "backend" => backend.to_string()
    )
    .increment(1);
    histogram!("router_request_duration_seconds", "service" => service.to_string())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_backend_health(backend: &str, healthy: bool) {
    gauge!("router_backend_health", "backend" => backend.to_string())
        .set(if healthy { 1.0 } else { 0.0 });
}

pub fn record_retry(host: &str) {
    counter!("router_retries_total", "host" => host.to_string()).increment(1);
}

pub fn record_duplicate(service: &str) {
    counter!("router_duplicates_total", "service" => service.to_string()).increment(1);
}

pub fn record_no_backend(service: &str) {
    counter!("router_no_backend_total", "service" => service.to_string()).increment(1);
}
