//! Backend abstraction.
//!
//! # Responsibilities
//! - Represent a single registered developer backend
//! - Map service names to target URLs
//! - Carry the static weight used by the weighted strategy

use std::collections::HashMap;

use url::Url;

/// A single backend ("developer") and its service endpoints.
///
/// Identifiers and service names are normalized to lowercase so lookups are
/// case-insensitive. Immutable once the registry is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Backend {
    id: String,
    endpoints: HashMap<String, Url>,
    weight: u32,
}

impl Backend {
    /// Create a backend with no endpoints and weight 1.
    pub fn new(id: &str) -> Self {
        Self {
            id: normalize(id),
            endpoints: HashMap::new(),
            weight: 1,
        }
    }

    pub fn with_endpoint(mut self, service: &str, url: Url) -> Self {
        self.add_endpoint(service, url);
        self
    }

    pub fn with_weight(mut self, weight: u32) -> Self {
        self.set_weight(weight);
        self
    }

    pub(crate) fn set_weight(&mut self, weight: u32) {
        self.weight = weight;
    }

    pub(crate) fn add_endpoint(&mut self, service: &str, url: Url) {
        self.endpoints.insert(normalize(service), url);
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn weight(&self) -> u32 {
        self.weight
    }

    /// Target URL for `service`, if this backend serves it.
    pub fn endpoint(&self, service: &str) -> Option<&Url> {
        self.endpoints.get(&normalize(service))
    }

    pub fn serves(&self, service: &str) -> bool {
        self.endpoint(service).is_some()
    }

    /// Service names this backend is configured for, sorted.
    pub fn services(&self) -> Vec<&str> {
        let mut services: Vec<_> = self.endpoints.keys().map(String::as_str).collect();
        services.sort_unstable();
        services
    }
}

pub(crate) fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}
