//! Upstream forwarding.
//!
//! # Responsibilities
//! - Build the outbound request (method, verbatim body, allow-listed headers)
//! - Enforce the per-attempt deadline and the overall budget
//! - Retry one transient transport failure while budget remains
//! - Classify transport failures into timeout / connection / upstream errors
//!
//! # Design Decisions
//! - Any upstream status code is a successful forward; only transport errors fail
//! - No connection reuse, no redirect following, HTTP/1.1 only
//! - The body is forwarded as received so signatures over it stay valid

use std::error::Error as StdError;
use std::fmt;
use std::io;
use std::time::Duration;

use axum::body::Bytes;
use axum::http::{HeaderMap, StatusCode};
use thiserror::Error;
use url::Url;

use crate::config::{ForwardingConfig, RetryConfig, TimeoutConfig};
use crate::http::headers::{relayable, HeaderPolicy};
use crate::http::request::InboundRequest;
use crate::observability::metrics;
use crate::resilience::{RetryPolicy, TimeBudget};

/// Error category surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForwardErrorKind {
    /// Deadline exceeded.
    Timeout,
    /// Connection refused, reset, or closed mid-exchange.
    Connection,
    /// Any other transport failure.
    Upstream,
}

impl ForwardErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ForwardErrorKind::Timeout => "timeout",
            ForwardErrorKind::Connection => "connection_error",
            ForwardErrorKind::Upstream => "upstream_error",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ForwardErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
            ForwardErrorKind::Connection => StatusCode::BAD_GATEWAY,
            ForwardErrorKind::Upstream => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for ForwardErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification of a single failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Failure {
    pub kind: ForwardErrorKind,
    /// Machine-readable upstream error code.
    pub code: &'static str,
    pub transient: bool,
}

impl Failure {
    const fn new(kind: ForwardErrorKind, code: &'static str, transient: bool) -> Self {
        Self { kind, code, transient }
    }

    pub const TIMEOUT: Failure = Failure::new(ForwardErrorKind::Timeout, "timeout", true);
}

/// A forward that failed after all allowed attempts.
#[derive(Debug, Clone, Error)]
#[error("{kind} ({code}) after {attempts} attempt(s) in {}ms: {message}", .elapsed.as_millis())]
pub struct ForwardError {
    pub kind: ForwardErrorKind,
    pub code: &'static str,
    pub transient: bool,
    pub attempts: u32,
    pub elapsed: Duration,
    pub message: String,
}

impl ForwardError {
    fn new(failure: Failure, attempts: u32, elapsed: Duration, message: impl Into<String>) -> Self {
        Self {
            kind: failure.kind,
            code: failure.code,
            transient: failure.transient,
            attempts,
            elapsed,
            message: message.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        self.kind.status_code()
    }
}

/// A relayed upstream response.
#[derive(Debug, Clone)]
pub struct ForwardResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub duration: Duration,
    pub attempts: u32,
}

/// Classify an I/O error kind found in a transport error chain.
pub fn classify_io(kind: io::ErrorKind) -> Failure {
    use io::ErrorKind::*;
    match kind {
        ConnectionRefused => Failure::new(ForwardErrorKind::Connection, "connection_refused", false),
        ConnectionReset | ConnectionAborted => {
            Failure::new(ForwardErrorKind::Connection, "connection_reset", true)
        }
        BrokenPipe => Failure::new(ForwardErrorKind::Connection, "broken_pipe", true),
        UnexpectedEof | NotConnected => {
            Failure::new(ForwardErrorKind::Connection, "connection_closed", true)
        }
        TimedOut => Failure::TIMEOUT,
        _ => Failure::new(ForwardErrorKind::Upstream, "io_error", true),
    }
}

/// Classify a failed reqwest call.
pub fn classify(err: &reqwest::Error) -> Failure {
    if err.is_timeout() {
        return Failure::TIMEOUT;
    }
    if err.is_builder() {
        return Failure::new(ForwardErrorKind::Upstream, "invalid_request", false);
    }

    let mut source: Option<&(dyn StdError + 'static)> = err.source();
    let mut chain = String::new();
    while let Some(cause) = source {
        if let Some(io_err) = cause.downcast_ref::<io::Error>() {
            let failure = classify_io(io_err.kind());
            if failure.code != "io_error" {
                return failure;
            }
        }
        chain.push_str(&cause.to_string().to_lowercase());
        chain.push(' ');
        source = cause.source();
    }

    if err.is_connect() && chain.contains("refused") {
        return Failure::new(ForwardErrorKind::Connection, "connection_refused", false);
    }
    if err.is_connect() && (chain.contains("dns") || chain.contains("lookup")) {
        return Failure::new(ForwardErrorKind::Upstream, "dns_error", true);
    }
    if chain.contains("connection closed") || chain.contains("connection reset") {
        return Failure::new(ForwardErrorKind::Connection, "connection_closed", true);
    }
    if err.is_body() || err.is_decode() {
        return Failure::new(ForwardErrorKind::Upstream, "body_aborted", true);
    }
    Failure::new(ForwardErrorKind::Upstream, "upstream_error", true)
}

/// Build the upstream URL: endpoint + path remainder + inbound query.
pub fn target_url(base: &Url, path_suffix: &str, query: Option<&str>) -> Url {
    let mut url = base.clone();
    if !path_suffix.is_empty() && path_suffix != "/" {
        let path = format!(
            "{}/{}",
            base.path().trim_end_matches('/'),
            path_suffix.trim_start_matches('/')
        );
        url.set_path(&path);
    }
    if let Some(query) = query.filter(|q| !q.is_empty()) {
        let merged = match base.query() {
            Some(existing) if !existing.is_empty() => format!("{existing}&{query}"),
            _ => query.to_string(),
        };
        url.set_query(Some(&merged));
    }
    url
}

/// Executes forwards against backend endpoints.
#[derive(Debug, Clone)]
pub struct Forwarder {
    client: reqwest::Client,
    headers: HeaderPolicy,
    timeouts: TimeoutConfig,
    retry: RetryPolicy,
}

impl Forwarder {
    pub fn new(
        forwarding: &ForwardingConfig,
        timeouts: &TimeoutConfig,
        retries: &RetryConfig,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .pool_max_idle_per_host(0)
            .http1_only()
            .no_proxy()
            .build()?;

        Ok(Self {
            client,
            headers: HeaderPolicy::from_config(forwarding),
            timeouts: timeouts.clone(),
            retry: RetryPolicy::from_config(retries, timeouts),
        })
    }

    /// Forward `request` to `target` + `path_suffix`, retrying once on transient failure.
    pub async fn forward(
        &self,
        request: &InboundRequest,
        target: &Url,
        path_suffix: &str,
    ) -> Result<ForwardResponse, ForwardError> {
        let url = target_url(target, path_suffix, request.query.as_deref());
        let budget = TimeBudget::from_config(&self.timeouts);
        let mut attempts = 0;

        loop {
            let deadline = budget.attempt_deadline();
            if deadline.is_zero() {
                return Err(ForwardError::new(
                    Failure::TIMEOUT,
                    attempts,
                    budget.elapsed(),
                    "time budget exhausted",
                ));
            }
            attempts += 1;

            match self.attempt(request, &url, deadline).await {
                Ok((status, headers, body)) => {
                    return Ok(ForwardResponse {
                        status,
                        headers,
                        body,
                        duration: budget.elapsed(),
                        attempts,
                    });
                }
                Err(err) => {
                    let failure = classify(&err);
                    let remaining = budget.remaining();
                    tracing::warn!(
                        url = %url,
                        attempt = attempts,
                        code = failure.code,
                        transient = failure.transient,
                        elapsed_ms = budget.elapsed().as_millis() as u64,
                        error = %err,
                        "Upstream attempt failed"
                    );

                    if self.retry.should_retry(attempts, failure.transient, remaining) {
                        metrics::record_retry(url.host_str().unwrap_or("unknown"));
                        continue;
                    }
                    return Err(ForwardError::new(failure, attempts, budget.elapsed(), err.to_string()));
                }
            }
        }
    }

    async fn attempt(
        &self,
        request: &InboundRequest,
        url: &Url,
        deadline: Duration,
    ) -> Result<(StatusCode, HeaderMap, Bytes), reqwest::Error> {
        let response = self
            .client
            .request(request.method.clone(), url.clone())
            .headers(self.headers.outbound(&request.headers))
            .body(request.body.clone())
            .timeout(deadline)
            .send()
            .await?;

        let status = response.status();
        let headers = relayable(response.headers());
        let body = response.bytes().await?;
        Ok((status, headers, body))
    }
}
