//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the router.
//! All types derive Serde traits for deserialization from config files.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::load_balancer::Strategy;

/// Root configuration for the webhook router.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RouterConfig {
    /// Listener configuration (bind address, body limit).
    pub listener: ListenerConfig,

    /// `(backend, service) -> url` records.
    pub endpoints: Vec<EndpointConfig>,

    /// Inbound route table mapping paths to services.
    pub routes: Vec<RouteConfig>,

    /// Selection strategy and static weights.
    pub balancer: BalancerConfig,

    /// Failure tracking settings.
    pub health: HealthConfig,

    /// Timeout budget for forwarding.
    pub timeouts: TimeoutConfig,

    /// Retry configuration.
    pub retries: RetryConfig,

    /// Outbound request shaping.
    pub forwarding: ForwardingConfig,

    /// Duplicate delivery suppression.
    pub dedup: DedupConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Admin endpoint settings.
    pub admin: AdminConfig,
}

impl RouterConfig {
    /// Routes to serve: the configured table, or the built-in Slack routes when empty.
    pub fn effective_routes(&self) -> Vec<RouteConfig> {
        if self.routes.is_empty() {
            RouteConfig::slack_defaults()
        } else {
            self.routes.clone()
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Maximum inbound body size in bytes.
    pub max_body_bytes: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_body_bytes: 2 * 1024 * 1024,
        }
    }
}

/// A single `(backend, service) -> url` record.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct EndpointConfig {
    /// Backend identifier (case-insensitive).
    pub backend: String,

    /// Logical service name (e.g. "events", "oauth").
    pub service: String,

    /// Target URL for this backend's service.
    pub url: String,
}

impl EndpointConfig {
    pub fn new(backend: impl Into<String>, service: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            backend: backend.into(),
            service: service.into(),
            url: url.into(),
        }
    }
}

/// Where the sticky affinity key comes from for a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AffinitySource {
    /// The request signature header.
    #[default]
    Signature,
    /// First hop of `X-Forwarded-For`, falling back to the peer address.
    ForwardedFor,
    /// The peer socket address.
    ClientIp,
    /// No affinity key.
    None,
}

/// Route configuration mapping inbound paths to a service.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteConfig {
    /// Route identifier for logging/metrics.
    pub name: String,

    /// Path prefix to match, on segment boundaries.
    pub path_prefix: String,

    /// Service name to forward to.
    pub service: String,

    /// Affinity key source for sticky selection.
    #[serde(default)]
    pub affinity: AffinitySource,
}

impl RouteConfig {
    pub fn new(
        name: impl Into<String>,
        path_prefix: impl Into<String>,
        service: impl Into<String>,
        affinity: AffinitySource,
    ) -> Self {
        Self {
            name: name.into(),
            path_prefix: path_prefix.into(),
            service: service.into(),
            affinity,
        }
    }

    /// The Slack callback routes served when no table is configured.
    pub fn slack_defaults() -> Vec<RouteConfig> {
        vec![
            RouteConfig::new("events", "/slack/events", "events", AffinitySource::Signature),
            RouteConfig::new(
                "interactions",
                "/slack/interactions",
                "interactions",
                AffinitySource::Signature,
            ),
            RouteConfig::new("commands", "/slack/commands", "commands", AffinitySource::Signature),
            RouteConfig::new("oauth", "/slack/oauth", "oauth", AffinitySource::ForwardedFor),
        ]
    }
}

/// Load balancer configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct BalancerConfig {
    /// Selection strategy.
    pub strategy: Strategy,

    /// Static weights by backend id for the weighted strategy (default: 1).
    pub weights: HashMap<String, u32>,
}

/// Failure tracking configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthConfig {
    /// Number of consecutive transient failures before marking unhealthy.
    pub failure_threshold: u32,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
        }
    }
}

/// Timeout configuration for forwarding.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Deadline for a single upstream attempt in milliseconds.
    pub attempt_ms: u64,

    /// Total budget across all attempts in milliseconds.
    pub overall_ms: u64,

    /// A retry is only issued while more than this much budget remains.
    pub retry_margin_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            attempt_ms: 2_700,
            overall_ms: 3_000,
            retry_margin_ms: 1_500,
        }
    }
}

/// Retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum number of attempts per forward (1 disables retries).
    pub max_attempts: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self { max_attempts: 2 }
    }
}

/// Outbound request shaping.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ForwardingConfig {
    /// Inbound headers copied to the upstream request (case-insensitive).
    pub allowed_headers: Vec<String>,

    /// Fixed header added to every upstream request.
    pub bypass_header_name: String,
    pub bypass_header_value: String,
}

impl Default for ForwardingConfig {
    fn default() -> Self {
        Self {
            allowed_headers: [
                "content-type",
                "accept",
                "user-agent",
                "x-slack-signature",
                "x-slack-request-timestamp",
                "x-slack-retry-num",
                "x-slack-retry-reason",
            ]
            .iter()
            .map(|h| h.to_string())
            .collect(),
            bypass_header_name: "ngrok-skip-browser-warning".to_string(),
            bypass_header_value: "true".to_string(),
        }
    }
}

/// Duplicate delivery suppression.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DedupConfig {
    /// Enable duplicate suppression.
    pub enabled: bool,

    /// Maximum number of remembered keys.
    pub capacity: usize,

    /// How long a key counts as a duplicate, in seconds.
    pub window_secs: u64,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            capacity: 1_000,
            window_secs: 300,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Admin endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AdminConfig {
    /// When set, `POST /reset-health` requires `Authorization: Bearer <api_key>`.
    pub api_key: Option<String>,
}
