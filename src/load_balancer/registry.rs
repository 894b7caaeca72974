//! Backend registry.
//!
//! # Responsibilities
//! - Hold every configured backend in insertion order
//! - Resolve `(backend, service)` to a target URL
//! - Provide the per-service candidate list for selection
//!
//! Built once at startup and never mutated, so it is shared behind an `Arc`
//! without locking.

use url::Url;

use crate::config::{BalancerConfig, EndpointConfig};
use crate::load_balancer::backend::{normalize, Backend};

/// Immutable backend registry.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    backends: Vec<Backend>,
}

impl Registry {
    /// Build from already-constructed backends. Duplicate ids keep the first.
    pub fn new(backends: Vec<Backend>) -> Self {
        let mut registry = Self::default();
        for backend in backends {
            if registry.get(backend.id()).is_some() {
                tracing::warn!(backend = %backend.id(), "Duplicate backend ignored");
                continue;
            }
            if backend.services().is_empty() {
                tracing::warn!(backend = %backend.id(), "Backend has no services and will never be selected");
            }
            registry.backends.push(backend);
        }
        registry
    }

    /// Build from endpoint records and balancer weights.
    ///
    /// Backend order is the order of first appearance in `records`. Records with
    /// unparseable URLs are skipped (validation reports them before this point).
    pub fn from_config(records: &[EndpointConfig], balancer: &BalancerConfig) -> Self {
        let mut backends: Vec<Backend> = Vec::new();

        for record in records {
            let url = match Url::parse(&record.url) {
                Ok(url) => url,
                Err(e) => {
                    tracing::warn!(backend = %record.backend, service = %record.service, error = %e, "Invalid endpoint url");
                    continue;
                }
            };

            let id = normalize(&record.backend);
            match backends.iter_mut().find(|b| b.id() == id) {
                Some(backend) => backend.add_endpoint(&record.service, url),
                None => backends.push(Backend::new(&id).with_endpoint(&record.service, url)),
            }
        }

        for (name, weight) in &balancer.weights {
            let id = normalize(name);
            if let Some(backend) = backends.iter_mut().find(|b| b.id() == id) {
                backend.set_weight(*weight);
            }
        }

        Self::new(backends)
    }

    /// All backend identifiers, in insertion order.
    pub fn list_backends(&self) -> Vec<&str> {
        self.backends.iter().map(Backend::id).collect()
    }

    pub fn get(&self, backend_id: &str) -> Option<&Backend> {
        let id = normalize(backend_id);
        self.backends.iter().find(|b| b.id() == id)
    }

    /// Target URL for a backend's service.
    pub fn endpoint(&self, backend_id: &str, service: &str) -> Option<&Url> {
        self.get(backend_id).and_then(|b| b.endpoint(service))
    }

    /// Backends configured for `service`, in insertion order.
    pub fn backends_for<'a>(&'a self, service: &'a str) -> impl Iterator<Item = &'a Backend> + 'a {
        self.backends.iter().filter(move |b| b.serves(service))
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records() -> Vec<EndpointConfig> {
        vec![
            EndpointConfig::new("Carol", "events", "https://carol.example.com/slack/events"),
            EndpointConfig::new("alice", "events", "https://alice.example.com/slack/events"),
            EndpointConfig::new("alice", "oauth", "https://alice.example.com/slack/oauth"),
            EndpointConfig::new("bob", "oauth", "https://bob.example.com/slack/oauth"),
        ]
    }

    #[test]
    fn preserves_insertion_order() {
        let registry = Registry::from_config(&records(), &BalancerConfig::default());
        assert_eq!(registry.list_backends(), ["carol", "alice", "bob"]);

        let events: Vec<_> = registry.backends_for("events").map(Backend::id).collect();
        assert_eq!(events, ["carol", "alice"]);
    }

    #[test]
    fn resolves_endpoints() {
        let registry = Registry::from_config(&records(), &BalancerConfig::default());
        assert_eq!(
            registry.endpoint("ALICE", "oauth").map(Url::as_str),
            Some("https://alice.example.com/slack/oauth")
        );
        assert!(registry.endpoint("bob", "events").is_none());
        assert!(registry.endpoint("dave", "events").is_none());
    }

    #[test]
    fn applies_weights_case_insensitively() {
        let mut balancer = BalancerConfig::default();
        balancer.weights.insert("BOB".into(), 4);
        let registry = Registry::from_config(&records(), &balancer);

        assert_eq!(registry.get("bob").unwrap().weight(), 4);
        assert_eq!(registry.get("alice").unwrap().weight(), 1);
    }

    #[test]
    fn tolerates_backend_without_services() {
        let registry = Registry::new(vec![Backend::new("empty")]);
        assert_eq!(registry.list_backends(), ["empty"]);
        assert_eq!(registry.backends_for("events").count(), 0);
    }
}
