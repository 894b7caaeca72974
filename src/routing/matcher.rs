//! Route matching logic.
//!
//! # Responsibilities
//! - Match the inbound path against configured service routes
//! - Split off the path remainder forwarded to the backend
//!
//! # Design Decisions
//! - Path matching is case-sensitive
//! - Prefixes match on segment boundaries (`/slack/events` does not match `/slack/eventsx`)
//! - Longest prefix wins, so overlapping routes are order-independent
//! - No regex to guarantee O(n) matching

use crate::config::{AffinitySource, RouteConfig};

/// A compiled service route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceRoute {
    pub name: String,
    pub prefix: String,
    pub service: String,
    pub affinity: AffinitySource,
}

impl ServiceRoute {
    /// Path remainder after the prefix if `path` is under this route.
    pub fn strip<'p>(&self, path: &'p str) -> Option<&'p str> {
        let rest = path.strip_prefix(self.prefix.as_str())?;
        if rest.is_empty() || rest.starts_with('/') || self.prefix.ends_with('/') {
            Some(rest)
        } else {
            None
        }
    }
}

/// A route match: the route and the path remainder to forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteMatch<'r, 'p> {
    pub route: &'r ServiceRoute,
    pub suffix: &'p str,
}

/// Immutable route table.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<ServiceRoute>,
}

impl RouteTable {
    pub fn from_config(routes: &[RouteConfig]) -> Self {
        let mut routes: Vec<ServiceRoute> = routes
            .iter()
            .map(|r| ServiceRoute {
                name: r.name.clone(),
                prefix: normalize_prefix(&r.path_prefix),
                service: r.service.trim().to_lowercase(),
                affinity: r.affinity,
            })
            .collect();
        // Longest prefix first
        routes.sort_by(|a, b| b.prefix.len().cmp(&a.prefix.len()));
        Self { routes }
    }

    pub fn match_path<'r, 'p>(&'r self, path: &'p str) -> Option<RouteMatch<'r, 'p>> {
        self.routes.iter().find_map(|route| {
            route.strip(path).map(|suffix| RouteMatch { route, suffix })
        })
    }

    pub fn routes(&self) -> &[ServiceRoute] {
        &self.routes
    }
}

fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim();
    if trimmed.len() > 1 {
        trimmed.trim_end_matches('/').to_string()
    } else {
        trimmed.to_string()
    }
}
