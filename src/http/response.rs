//! Response handling and transformation.
//!
//! # Responsibilities
//! - Relay upstream status, headers, and body
//! - Map dispatch errors to status codes with a structured JSON body
//!
//! # Design Decisions
//! - Hop-by-hop headers stripped from relayed responses
//! - Timeouts → 504, connection failures → 502, no backend → 503, anything else → 500

use axum::{
    body::Body,
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::routing::router::{Dispatched, RouteError};

pub const X_ROUTER_BACKEND: &str = "x-router-backend";
pub const X_ROUTER_DUPLICATE: &str = "x-router-duplicate";

/// JSON body of every error produced by the router.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
    pub service: Option<String>,
    pub backend: Option<String>,
    pub elapsed_ms: u64,
    pub upstream_error: Option<&'static str>,
}

impl ErrorBody {
    pub fn not_found(path: &str) -> Self {
        Self {
            error: "no_route",
            message: format!("no route for {path}"),
            service: None,
            backend: None,
            elapsed_ms: 0,
            upstream_error: None,
        }
    }
}

impl RouteError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            RouteError::NoBackend { .. } => StatusCode::SERVICE_UNAVAILABLE,
            RouteError::Forward { source, .. } => source.status_code(),
            RouteError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn body(&self) -> ErrorBody {
        match self {
            RouteError::NoBackend { service, elapsed } => ErrorBody {
                error: "no_backend",
                message: "no available backend".to_string(),
                service: Some(service.clone()),
                backend: None,
                elapsed_ms: elapsed.as_millis() as u64,
                upstream_error: None,
            },
            RouteError::Forward {
                service,
                backend,
                source,
            } => ErrorBody {
                error: source.kind.as_str(),
                message: source.message.clone(),
                service: Some(service.clone()),
                backend: Some(backend.clone()),
                elapsed_ms: source.elapsed.as_millis() as u64,
                upstream_error: Some(source.code),
            },
            RouteError::Internal {
                service,
                backend,
                elapsed,
                message,
            } => ErrorBody {
                error: "internal_error",
                message: message.clone(),
                service: Some(service.clone()),
                backend: backend.clone(),
                elapsed_ms: elapsed.as_millis() as u64,
                upstream_error: None,
            },
        }
    }
}

impl IntoResponse for RouteError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.body())).into_response()
    }
}

impl IntoResponse for Dispatched {
    fn into_response(self) -> Response {
        match self {
            Dispatched::Forwarded { backend, response } => {
                let mut relayed = Response::new(Body::from(response.body));
                *relayed.status_mut() = response.status;
                *relayed.headers_mut() = response.headers;
                if let Ok(value) = HeaderValue::from_str(&backend) {
                    relayed.headers_mut().insert(X_ROUTER_BACKEND, value);
                }
                relayed
            }
            Dispatched::Duplicate => (
                StatusCode::OK,
                [(X_ROUTER_DUPLICATE, HeaderValue::from_static("true"))],
            )
                .into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::forwarder::{ForwardError, ForwardErrorKind};
    use std::time::Duration;

    fn forward_error(kind: ForwardErrorKind, code: &'static str) -> RouteError {
        RouteError::Forward {
            service: "events".into(),
            backend: "alice".into(),
            source: ForwardError {
                kind,
                code,
                transient: true,
                attempts: 2,
                elapsed: Duration::from_millis(2_750),
                message: "boom".into(),
            },
        }
    }

    #[test]
    fn maps_statuses() {
        assert_eq!(
            RouteError::NoBackend {
                service: "events".into(),
                elapsed: Duration::ZERO,
            }
            .status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            forward_error(ForwardErrorKind::Timeout, "timeout").status_code(),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            forward_error(ForwardErrorKind::Connection, "connection_reset").status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            forward_error(ForwardErrorKind::Upstream, "dns_error").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn error_body_carries_backend_and_elapsed() {
        let body = forward_error(ForwardErrorKind::Timeout, "timeout").body();
        assert_eq!(body.error, "timeout");
        assert_eq!(body.backend.as_deref(), Some("alice"));
        assert_eq!(body.elapsed_ms, 2_750);
        assert_eq!(body.upstream_error, Some("timeout"));

        let no_backend = RouteError::NoBackend {
            service: "oauth".into(),
            elapsed: Duration::from_millis(7),
        };
        let json = serde_json::to_value(no_backend.body()).unwrap();
        assert_eq!(json["error"], "no_backend");
        assert_eq!(json["elapsed_ms"], 7);
        assert_eq!(json["message"], "no available backend");
        assert!(json["backend"].is_null());
    }
}
