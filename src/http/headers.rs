//! Header manipulation for forwarded requests and relayed responses.
//!
//! # Responsibilities
//! - Copy only allow-listed inbound headers upstream
//! - Strip hop-by-hop and protocol-negotiation headers in both directions
//! - Add the fixed bypass header and `Connection: close` upstream
//!
//! # Design Decisions
//! - Allow-list, not deny-list, for the upstream direction
//! - Hop-by-hop headers are dropped even if allow-listed

use axum::http::header::{self, HeaderMap, HeaderName, HeaderValue};

use crate::config::ForwardingConfig;

/// Headers that only make sense for a single connection.
const HOP_BY_HOP: [&str; 11] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "proxy-connection",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
    "http2-settings",
    "host",
];

pub fn is_hop_by_hop(name: &HeaderName) -> bool {
    HOP_BY_HOP.contains(&name.as_str())
}

/// Compiled outbound header policy.
#[derive(Debug, Clone)]
pub struct HeaderPolicy {
    allowed: Vec<HeaderName>,
    bypass: Option<(HeaderName, HeaderValue)>,
}

impl HeaderPolicy {
    /// Compile the forwarding config. Invalid names are logged and skipped.
    pub fn from_config(config: &ForwardingConfig) -> Self {
        let allowed = config
            .allowed_headers
            .iter()
            .filter_map(|name| match HeaderName::from_bytes(name.trim().to_lowercase().as_bytes()) {
                Ok(name) if !is_hop_by_hop(&name) => Some(name),
                Ok(name) => {
                    tracing::warn!(header = %name, "Hop-by-hop header cannot be forwarded");
                    None
                }
                Err(_) => {
                    tracing::warn!(header = %name, "Invalid header name in allow-list");
                    None
                }
            })
            .collect();

        let bypass = if config.bypass_header_name.is_empty() {
            None
        } else {
            match (
                HeaderName::from_bytes(config.bypass_header_name.to_lowercase().as_bytes()),
                HeaderValue::from_str(&config.bypass_header_value),
            ) {
                (Ok(name), Ok(value)) => Some((name, value)),
                _ => {
                    tracing::warn!(header = %config.bypass_header_name, "Invalid bypass header ignored");
                    None
                }
            }
        };

        Self { allowed, bypass }
    }

    /// Headers for the upstream request.
    pub fn outbound(&self, inbound: &HeaderMap) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for name in &self.allowed {
            for value in inbound.get_all(name) {
                headers.append(name.clone(), value.clone());
            }
        }
        if let Some((name, value)) = &self.bypass {
            headers.insert(name.clone(), value.clone());
        }
        headers.insert(header::CONNECTION, HeaderValue::from_static("close"));
        headers
    }
}

impl Default for HeaderPolicy {
    fn default() -> Self {
        Self::from_config(&ForwardingConfig::default())
    }
}

/// Upstream response headers safe to relay to the caller.
pub fn relayable(upstream: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::new();
    for (name, value) in upstream {
        if !is_hop_by_hop(name) && name != header::CONTENT_LENGTH {
            headers.append(name.clone(), value.clone());
        }
    }
    headers
}
