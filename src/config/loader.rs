//! Configuration loading from disk and the process environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::{EndpointConfig, RouterConfig};
use crate::config::validation::{validate_config, ValidationError};
use crate::load_balancer::Strategy;

/// Prefix for endpoint records: `WEBHOOK_ROUTER__ENDPOINT__<BACKEND>__<SERVICE>=<url>`.
pub const ENDPOINT_ENV_PREFIX: &str = "WEBHOOK_ROUTER__ENDPOINT__";
pub const STRATEGY_ENV: &str = "WEBHOOK_ROUTER_STRATEGY";
pub const BIND_ENV: &str = "WEBHOOK_ROUTER_BIND";
pub const LOG_ENV: &str = "WEBHOOK_ROUTER_LOG";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid {var}: {reason}")]
    Env { var: String, reason: String },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse a TOML document into a configuration (unvalidated).
pub fn parse_config(content: &str) -> Result<RouterConfig, ConfigError> {
    Ok(toml::from_str(content)?)
}

/// Load configuration from a TOML file (unvalidated; the environment is not applied).
pub fn load_config(path: &Path) -> Result<RouterConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Overlay environment variables onto a configuration.
///
/// An endpoint record for a `(backend, service)` pair the file already defines
/// replaces that record's URL in place. New pairs are appended after the
/// file's records, in sorted key order so registry order is stable across runs.
pub fn apply_env<I>(mut config: RouterConfig, vars: I) -> Result<RouterConfig, ConfigError>
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut records = Vec::new();

    for (key, value) in vars {
        if let Some(rest) = key.strip_prefix(ENDPOINT_ENV_PREFIX) {
            let Some((backend, service)) = rest.split_once("__") else {
                return Err(ConfigError::Env {
                    var: key.clone(),
                    reason: "expected <BACKEND>__<SERVICE>".to_string(),
                });
            };
            if backend.is_empty() || service.is_empty() {
                return Err(ConfigError::Env {
                    var: key.clone(),
                    reason: "empty backend or service".to_string(),
                });
            }
            records.push((
                key.clone(),
                EndpointConfig::new(backend.to_lowercase(), service.to_lowercase(), value),
            ));
            continue;
        }

        match key.as_str() {
            STRATEGY_ENV => {
                config.balancer.strategy = value.parse::<Strategy>().map_err(|reason| ConfigError::Env {
                    var: key.clone(),
                    reason,
                })?;
            }
            BIND_ENV => config.listener.bind_address = value,
            LOG_ENV => config.observability.log_level = value,
            _ => {}
        }
    }

    records.sort_by(|a, b| a.0.cmp(&b.0));
    for (_, record) in records {
        let existing = config.endpoints.iter_mut().find(|e| {
            e.backend.trim().eq_ignore_ascii_case(&record.backend)
                && e.service.trim().eq_ignore_ascii_case(&record.service)
        });
        match existing {
            Some(endpoint) => {
                tracing::info!(
                    backend = %record.backend,
                    service = %record.service,
                    "Environment overrides configured endpoint"
                );
                endpoint.url = record.url;
            }
            None => config.endpoints.push(record),
        }
    }

    Ok(config)
}

/// Build the startup configuration: optional file, then environment, then validation.
pub fn load_from_sources<I>(path: Option<&Path>, vars: I) -> Result<RouterConfig, ConfigError>
where
    I: IntoIterator<Item = (String, String)>,
{
    let base = match path {
        Some(path) => load_config(path)?,
        None => RouterConfig::default(),
    };
    let config = apply_env(base, vars)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::AffinitySource;

    #[test]
    fn parses_minimal_toml() {
        let config = parse_config(
            r#"
            [listener]
            bind_address = "127.0.0.1:9000"

            [balancer]
            strategy = "least_connections"
            weights = { alice = 3 }

            [[endpoints]]
            backend = "alice"
            service = "events"
            url = "https://alice.example.com/slack/events"

            [[routes]]
            name = "oauth"
            path_prefix = "/slack/oauth"
            service = "oauth"
            affinity = "forwarded_for"
            "#,
        )
        .unwrap();

        assert_eq!(config.listener.bind_address, "127.0.0.1:9000");
        assert_eq!(config.balancer.strategy, Strategy::LeastConnections);
        assert_eq!(config.balancer.weights["alice"], 3);
        assert_eq!(config.endpoints.len(), 1);
        assert_eq!(config.routes[0].affinity, AffinitySource::ForwardedFor);
        assert_eq!(config.timeouts.overall_ms, 3_000);
        assert_eq!(config.health.failure_threshold, 3);
    }

    #[test]
    fn env_overlays_endpoints_and_strategy() {
        let vars = vec![
            (
                "WEBHOOK_ROUTER__ENDPOINT__BOB__EVENTS".to_string(),
                "https://bob.example.com/slack/events".to_string(),
            ),
            (
                "WEBHOOK_ROUTER__ENDPOINT__ALICE__EVENTS".to_string(),
                "https://alice.example.com/slack/events".to_string(),
            ),
            ("WEBHOOK_ROUTER_STRATEGY".to_string(), "sticky".to_string()),
            ("HOME".to_string(), "/root".to_string()),
        ];
        let config = load_from_sources(None, vars).unwrap();

        assert_eq!(config.balancer.strategy, Strategy::Sticky);
        let backends: Vec<_> = config.endpoints.iter().map(|e| e.backend.as_str()).collect();
        assert_eq!(backends, ["alice", "bob"]);
        assert_eq!(config.endpoints[0].service, "events");
    }

    #[test]
    fn env_record_replaces_file_record_for_same_pair() {
        let path = std::env::temp_dir().join(format!("webhook-router-{}.toml", std::process::id()));
        fs::write(
            &path,
            r#"
            [[endpoints]]
            backend = "Alice"
            service = "events"
            url = "https://old.example.com/slack/events"

            [[endpoints]]
            backend = "bob"
            service = "events"
            url = "https://bob.example.com/slack/events"
            "#,
        )
        .unwrap();

        let vars = vec![(
            "WEBHOOK_ROUTER__ENDPOINT__ALICE__EVENTS".to_string(),
            "https://new.example.com/slack/events".to_string(),
        )];
        let config = load_from_sources(Some(&path), vars);
        fs::remove_file(&path).unwrap();
        let config = config.unwrap();

        assert_eq!(config.endpoints.len(), 2);
        assert_eq!(config.endpoints[0].backend, "Alice");
        assert_eq!(config.endpoints[0].url, "https://new.example.com/slack/events");
        assert_eq!(config.endpoints[1].backend, "bob");
    }

    #[test]
    fn load_config_reads_file_without_validating() {
        let path = std::env::temp_dir().join(format!("webhook-router-raw-{}.toml", std::process::id()));
        fs::write(&path, "[health]\nfailure_threshold = 0\n").unwrap();
        let config = load_config(&path);
        fs::remove_file(&path).unwrap();
        assert_eq!(config.unwrap().health.failure_threshold, 0);

        assert!(matches!(
            load_config(Path::new("/nonexistent/webhook-router.toml")),
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn env_rejects_malformed_keys() {
        let vars = vec![(
            "WEBHOOK_ROUTER__ENDPOINT__ALICE".to_string(),
            "https://alice.example.com".to_string(),
        )];
        assert!(matches!(
            apply_env(RouterConfig::default(), vars),
            Err(ConfigError::Env { .. })
        ));

        let vars = vec![("WEBHOOK_ROUTER_STRATEGY".to_string(), "fastest".to_string())];
        assert!(matches!(
            apply_env(RouterConfig::default(), vars),
            Err(ConfigError::Env { .. })
        ));
    }
}
