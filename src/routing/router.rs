//! Webhook dispatch: selection → forwarding → health update.
//!
//! # Responsibilities
//! - Own the shared routing state (registry, health tracker, selector)
//! - Dispatch one inbound request to one backend
//! - Feed the forward outcome back into the health tracker
//!
//! # Design Decisions
//! - "No backend" is answered without forwarding and without health mutation
//! - Upstream status codes are relayed verbatim and never count as failures
//! - No lock is held while the forward is in flight

use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::config::{DedupConfig, RouterConfig};
use crate::health::HealthTracker;
use crate::http::forwarder::{ForwardError, ForwardResponse, Forwarder};
use crate::http::request::InboundRequest;
use crate::load_balancer::{Registry, Selector, Strategy};
use crate::observability::metrics;
use crate::routing::dedup::DedupCache;
use crate::routing::matcher::ServiceRoute;

/// Failure of a dispatch, carrying what operators need to diagnose it.
#[derive(Debug, Error)]
pub enum RouteError {
    #[error("no available backend for service {service}")]
    NoBackend { service: String, elapsed: Duration },

    #[error("forward to {backend} failed: {source}")]
    Forward {
        service: String,
        backend: String,
        #[source]
        source: ForwardError,
    },

    #[error("internal error: {message}")]
    Internal {
        service: String,
        backend: Option<String>,
        elapsed: Duration,
        message: String,
    },
}

impl RouteError {
    pub fn backend(&self) -> Option<&str> {
        match self {
            RouteError::NoBackend { .. } => None,
            RouteError::Forward { backend, .. } => Some(backend),
            RouteError::Internal { backend, .. } => backend.as_deref(),
        }
    }
}

/// Result of a dispatch that did not fail.
#[derive(Debug)]
pub enum Dispatched {
    /// Forwarded; the upstream response is relayed.
    Forwarded {
        backend: String,
        response: ForwardResponse,
    },
    /// Same idempotency key seen recently; answered without forwarding.
    Duplicate,
}

/// The routing engine.
#[derive(Debug)]
pub struct WebhookRouter {
    registry: Arc<Registry>,
    health: Arc<HealthTracker>,
    selector: Selector,
    forwarder: Forwarder,
    dedup: Option<DedupCache>,
}

impl WebhookRouter {
    pub fn new(
        registry: Arc<Registry>,
        health: Arc<HealthTracker>,
        strategy: Strategy,
        forwarder: Forwarder,
        dedup: Option<DedupCache>,
    ) -> Self {
        let selector = Selector::new(registry.clone(), health.clone(), strategy);
        Self {
            registry,
            health,
            selector,
            forwarder,
            dedup,
        }
    }

    /// Build the whole engine from a validated configuration.
    pub fn from_config(config: &RouterConfig) -> Result<Self, reqwest::Error> {
        let registry = Arc::new(Registry::from_config(&config.endpoints, &config.balancer));
        let health = Arc::new(HealthTracker::new(
            registry.list_backends(),
            config.health.failure_threshold,
        ));
        let forwarder = Forwarder::new(&config.forwarding, &config.timeouts, &config.retries)?;

        tracing::info!(
            backends = registry.len(),
            strategy = %config.balancer.strategy,
            failure_threshold = health.failure_threshold(),
            "Routing engine initialized"
        );

        Ok(Self::new(
            registry,
            health,
            config.balancer.strategy,
            forwarder,
            dedup_cache(&config.dedup),
        ))
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn health(&self) -> &HealthTracker {
        &self.health
    }

    pub fn selector(&self) -> &Selector {
        &self.selector
    }

    pub fn strategy(&self) -> Strategy {
        self.selector.strategy()
    }

    /// Route one inbound request for `route`, forwarding `suffix` under the endpoint URL.
    pub async fn dispatch(
        &self,
        route: &ServiceRoute,
        suffix: &str,
        request: &InboundRequest,
    ) -> Result<Dispatched, RouteError> {
        let started = Instant::now();
        let service = route.service.as_str();

        let dedup_key = match (&self.dedup, request.idempotency_key()) {
            (Some(cache), Some(key)) => {
                if cache.check_and_insert(&key) {
                    tracing::info!(service = %service, "Duplicate delivery suppressed");
                    metrics::record_duplicate(service);
                    return Ok(Dispatched::Duplicate);
                }
                Some(key)
            }
            _ => None,
        };

        let affinity = request.affinity_key(route.affinity);
        let Some(backend) = self.selector.select(service, affinity.as_deref()) else {
            self.forget(dedup_key.as_deref());
            metrics::record_no_backend(service);
            tracing::warn!(service = %service, "No available backend");
            return Err(RouteError::NoBackend {
                service: service.to_string(),
                elapsed: started.elapsed(),
            });
        };

        let Some(target) = self.registry.endpoint(&backend, service) else {
            // Unreachable while the registry is immutable.
            self.forget(dedup_key.as_deref());
            return Err(RouteError::Internal {
                service: service.to_string(),
                backend: Some(backend),
                elapsed: started.elapsed(),
                message: "selected backend has no endpoint for service".to_string(),
            });
        };

        match self.forwarder.forward(request, target, suffix).await {
            Ok(response) => {
                self.health.report_success(&backend);
                metrics::record_backend_health(&backend, true);
                tracing::info!(
                    service = %service,
                    backend = %backend,
                    status = response.status.as_u16(),
                    attempts = response.attempts,
                    elapsed_ms = response.duration.as_millis() as u64,
                    "Forwarded"
                );
                Ok(Dispatched::Forwarded { backend, response })
            }
            Err(err) => {
                self.forget(dedup_key.as_deref());
                self.health.report_failure(&backend, err.transient);
                metrics::record_backend_health(&backend, self.health.is_healthy(&backend));
                tracing::error!(
                    service = %service,
                    backend = %backend,
                    kind = %err.kind,
                    code = err.code,
                    attempts = err.attempts,
                    elapsed_ms = err.elapsed.as_millis() as u64,
                    "Forward failed"
                );
                Err(RouteError::Forward {
                    service: service.to_string(),
                    backend,
                    source: err,
                })
            }
        }
    }

    fn forget(&self, key: Option<&str>) {
        if let (Some(cache), Some(key)) = (&self.dedup, key) {
            cache.remove(key);
        }
    }
}

fn dedup_cache(config: &DedupConfig) -> Option<DedupCache> {
    config.enabled.then(|| DedupCache::from_config(config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AffinitySource, EndpointConfig, RouteConfig};
    use crate::http::request::{SIGNATURE_HEADER, TIMESTAMP_HEADER};
    use crate::routing::matcher::RouteTable;
    use axum::body::Bytes;
    use axum::http::{HeaderMap, HeaderValue, Method};

    fn signed_request() -> InboundRequest {
        let mut headers = HeaderMap::new();
        headers.insert(SIGNATURE_HEADER, HeaderValue::from_static("v0=abc"));
        headers.insert(TIMESTAMP_HEADER, HeaderValue::from_static("1700000000"));
        InboundRequest::new(Method::POST, "/slack/events", headers, Bytes::from_static(b"{}"))
    }

    #[tokio::test]
    async fn no_backend_is_reported_without_health_change() {
        let mut config = RouterConfig::default();
        config
            .endpoints
            .push(EndpointConfig::new("alice", "oauth", "http://127.0.0.1:9/slack/oauth"));
        let router = WebhookRouter::from_config(&config).unwrap();
        assert_eq!(router.health().failure_threshold(), 3);
        let table = RouteTable::from_config(&[RouteConfig::new(
            "events",
            "/slack/events",
            "events",
            AffinitySource::Signature,
        )]);
        let matched = table.match_path("/slack/events").unwrap();

        let err = router
            .dispatch(matched.route, matched.suffix, &signed_request())
            .await
            .unwrap_err();
        assert!(matches!(err, RouteError::NoBackend { ref service, .. } if service == "events"));
        assert_eq!(err.backend(), None);
        assert_eq!(router.health().get("alice"), Default::default());

        // The key was not remembered, so a repeat is routed again rather than suppressed.
        let err = router
            .dispatch(matched.route, matched.suffix, &signed_request())
            .await
            .unwrap_err();
        assert!(matches!(err, RouteError::NoBackend { .. }));
    }
}
