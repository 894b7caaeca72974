//! Request handling and transformation.
//!
//! # Responsibilities
//! - Generate unique request ID (UUID v4)
//! - Capture the inbound request with its raw body bytes
//! - Extract the affinity key and idempotency key
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - The body is kept as received; it is never re-serialized

use std::net::{IpAddr, SocketAddr};

use axum::body::Bytes;
use axum::http::{HeaderMap, HeaderValue, Method, Request};
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

use crate::config::AffinitySource;

pub const X_REQUEST_ID: &str = "x-request-id";
pub const SIGNATURE_HEADER: &str = "x-slack-signature";
pub const TIMESTAMP_HEADER: &str = "x-slack-request-timestamp";
pub const RETRY_NUM_HEADER: &str = "x-slack-retry-num";
pub const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";

/// Generates a UUID v4 for every request lacking an `x-request-id`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Read the request id set by the request-id layer.
pub fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

/// An inbound webhook call, fully buffered.
#[derive(Debug, Clone)]
pub struct InboundRequest {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub client_addr: Option<SocketAddr>,
}

impl InboundRequest {
    pub fn new(method: Method, path: impl Into<String>, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            method,
            path: path.into(),
            query: None,
            headers,
            body,
            client_addr: None,
        }
    }

    pub fn with_query(mut self, query: Option<&str>) -> Self {
        self.query = query.map(str::to_string);
        self
    }

    pub fn with_client_addr(mut self, addr: Option<SocketAddr>) -> Self {
        self.client_addr = addr;
        self
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }

    fn client_ip(&self) -> Option<IpAddr> {
        self.client_addr.map(|addr| addr.ip())
    }

    /// Affinity key for sticky selection.
    pub fn affinity_key(&self, source: AffinitySource) -> Option<String> {
        match source {
            AffinitySource::Signature => self.header(SIGNATURE_HEADER).map(str::to_string),
            AffinitySource::ForwardedFor => self
                .header(FORWARDED_FOR_HEADER)
                .and_then(|v| v.split(',').next())
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .or_else(|| self.client_ip().map(|ip| ip.to_string())),
            AffinitySource::ClientIp => self.client_ip().map(|ip| ip.to_string()),
            AffinitySource::None => None,
        }
    }

    /// `(signature, timestamp, retry-num)` key, when signature and timestamp are present.
    pub fn idempotency_key(&self) -> Option<String> {
        let signature = self.header(SIGNATURE_HEADER)?;
        let timestamp = self.header(TIMESTAMP_HEADER)?;
        let retry = self.header(RETRY_NUM_HEADER).unwrap_or("");
        Some(format!("{signature}|{timestamp}|{retry}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(headers: &[(&'static str, &'static str)]) -> InboundRequest {
        let mut map = HeaderMap::new();
        for &(name, value) in headers {
            map.insert(name, HeaderValue::from_static(value));
        }
        InboundRequest::new(Method::POST, "/slack/events", map, Bytes::from_static(b"{}"))
            .with_client_addr(Some("10.1.2.3:5555".parse().unwrap()))
    }

    #[test]
    fn affinity_from_signature() {
        let req = request(&[(SIGNATURE_HEADER, "v0=abc")]);
        assert_eq!(req.affinity_key(AffinitySource::Signature).as_deref(), Some("v0=abc"));
        assert_eq!(request(&[]).affinity_key(AffinitySource::Signature), None);
    }

    #[test]
    fn affinity_from_forwarded_for_with_fallback() {
        let req = request(&[(FORWARDED_FOR_HEADER, "203.0.113.9, 10.0.0.1")]);
        assert_eq!(req.affinity_key(AffinitySource::ForwardedFor).as_deref(), Some("203.0.113.9"));

        let req = request(&[]);
        assert_eq!(req.affinity_key(AffinitySource::ForwardedFor).as_deref(), Some("10.1.2.3"));
        assert_eq!(req.affinity_key(AffinitySource::ClientIp).as_deref(), Some("10.1.2.3"));
        assert_eq!(req.affinity_key(AffinitySource::None), None);
    }

    #[test]
    fn idempotency_key_needs_signature_and_timestamp() {
        let req = request(&[(SIGNATURE_HEADER, "v0=abc"), (TIMESTAMP_HEADER, "1700000000")]);
        assert_eq!(req.idempotency_key().as_deref(), Some("v0=abc|1700000000|"));

        let req = request(&[
            (SIGNATURE_HEADER, "v0=abc"),
            (TIMESTAMP_HEADER, "1700000000"),
            (RETRY_NUM_HEADER, "2"),
        ]);
        assert_eq!(req.idempotency_key().as_deref(), Some("v0=abc|1700000000|2"));

        assert_eq!(request(&[(SIGNATURE_HEADER, "v0=abc")]).idempotency_key(), None);
    }

    #[test]
    fn generates_uuid_request_ids() {
        let req = Request::new(());
        let id = MakeRequestUuid.make_request_id(&req).unwrap();
        let value = id.header_value().to_str().unwrap();
        assert!(Uuid::parse_str(value).is_ok());
    }
}
