//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check endpoint records (parseable URLs, no duplicate pairs)
//! - Validate value ranges (timeouts, thresholds, weights)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RouterConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;

use thiserror::Error;
use url::Url;

use crate::config::schema::RouterConfig;

/// A single semantic problem found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("endpoint {backend}/{service}: invalid url {url:?}: {reason}")]
    InvalidUrl {
        backend: String,
        service: String,
        url: String,
        reason: String,
    },

    #[error("endpoint {backend}/{service} is configured more than once")]
    DuplicateEndpoint { backend: String, service: String },

    #[error("endpoint record has an empty backend or service name")]
    EmptyName,

    #[error("weight for {backend} must be at least 1")]
    ZeroWeight { backend: String },

    #[error("health.failure_threshold must be at least 1")]
    ZeroThreshold,

    #[error("timeouts.attempt_ms ({attempt_ms}) must be between 1 and overall_ms ({overall_ms})")]
    AttemptExceedsBudget { attempt_ms: u64, overall_ms: u64 },

    #[error("timeouts.retry_margin_ms ({margin_ms}) must be below overall_ms ({overall_ms})")]
    MarginExceedsBudget { margin_ms: u64, overall_ms: u64 },

    #[error("retries.max_attempts must be 1 or 2, got {0}")]
    MaxAttempts(u32),

    #[error("route {name}: path_prefix {prefix:?} must start with '/'")]
    RoutePrefix { name: String, prefix: String },

    #[error("dedup.capacity must be at least 2, got {0}")]
    DedupCapacity(usize),
}

/// Validate a loaded configuration, collecting every problem found.
pub fn validate_config(config: &RouterConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let mut seen = HashSet::new();
    for endpoint in &config.endpoints {
        let backend = endpoint.backend.trim().to_lowercase();
        let service = endpoint.service.trim().to_lowercase();
        if backend.is_empty() || service.is_empty() {
            errors.push(ValidationError::EmptyName);
            continue;
        }

        match Url::parse(&endpoint.url) {
            Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
            Ok(url) => errors.push(ValidationError::InvalidUrl {
                backend: backend.clone(),
                service: service.clone(),
                url: endpoint.url.clone(),
                reason: format!("unsupported scheme {}", url.scheme()),
            }),
            Err(e) => errors.push(ValidationError::InvalidUrl {
                backend: backend.clone(),
                service: service.clone(),
                url: endpoint.url.clone(),
                reason: e.to_string(),
            }),
        }

        if !seen.insert((backend.clone(), service.clone())) {
            errors.push(ValidationError::DuplicateEndpoint { backend, service });
        }
    }

    let known: HashSet<_> = seen.iter().map(|(b, _)| b.clone()).collect();
    for (backend, weight) in &config.balancer.weights {
        if *weight == 0 {
            errors.push(ValidationError::ZeroWeight {
                backend: backend.clone(),
            });
        }
        if !known.contains(&backend.to_lowercase()) {
            tracing::warn!(backend = %backend, "Weight configured for unknown backend");
        }
    }

    if config.health.failure_threshold == 0 {
        errors.push(ValidationError::ZeroThreshold);
    }

    let t = &config.timeouts;
    if t.attempt_ms == 0 || t.attempt_ms > t.overall_ms {
        errors.push(ValidationError::AttemptExceedsBudget {
            attempt_ms: t.attempt_ms,
            overall_ms: t.overall_ms,
        });
    }
    if t.retry_margin_ms >= t.overall_ms {
        errors.push(ValidationError::MarginExceedsBudget {
            margin_ms: t.retry_margin_ms,
            overall_ms: t.overall_ms,
        });
    }

    if !(1..=2).contains(&config.retries.max_attempts) {
        errors.push(ValidationError::MaxAttempts(config.retries.max_attempts));
    }

    for route in &config.routes {
        if !route.path_prefix.starts_with('/') {
            errors.push(ValidationError::RoutePrefix {
                name: route.name.clone(),
                prefix: route.path_prefix.clone(),
            });
        }
    }

    if config.dedup.enabled && config.dedup.capacity < 2 {
        errors.push(ValidationError::DedupCapacity(config.dedup.capacity));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
