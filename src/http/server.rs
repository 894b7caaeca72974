//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with the admin endpoints and the webhook fallback
//! - Wire up middleware (tracing, request ID, body limit, panic recovery)
//! - Buffer the inbound request and hand it to the routing engine
//! - Bind the server to a listener with graceful shutdown

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::{to_bytes, Body},
    extract::{ConnectInfo, State},
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    Json, Router,
};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::admin::admin_router;
use crate::config::RouterConfig;
use crate::http::request::{request_id, InboundRequest, MakeRequestUuid};
use crate::http::response::ErrorBody;
use crate::observability::metrics;
use crate::routing::matcher::RouteTable;
use crate::routing::router::{Dispatched, RouteError, WebhookRouter};

/// Slack for body buffering and response writing on top of the forward budget.
const REQUEST_TIMEOUT_GRACE: Duration = Duration::from_secs(2);

/// Application state injected into handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    pub router: Arc<WebhookRouter>,
    pub routes: Arc<RouteTable>,
    pub config: Arc<RouterConfig>,
}

impl AppState {
    pub fn new(config: RouterConfig) -> Result<Self, reqwest::Error> {
        let router = WebhookRouter::from_config(&config)?;
        let routes = RouteTable::from_config(&config.effective_routes());
        Ok(Self {
            router: Arc::new(router),
            routes: Arc::new(routes),
            config: Arc::new(config),
        })
    }
}

/// HTTP server for the webhook router.
pub struct HttpServer {
    router: Router,
    state: AppState,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: RouterConfig) -> Result<Self, reqwest::Error> {
        let state = AppState::new(config)?;
        let router = Self::build_router(state.clone());
        Ok(Self { router, state })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(state: AppState) -> Router {
        let max_body = state.config.listener.max_body_bytes;
        let request_timeout =
            Duration::from_millis(state.config.timeouts.overall_ms) + REQUEST_TIMEOUT_GRACE;

        let middleware = ServiceBuilder::new()
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(
                TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                    tracing::info_span!(
                        "request",
                        method = %request.method(),
                        path = %request.uri().path(),
                        request_id = %request_id(request.headers()),
                    )
                }),
            )
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TimeoutLayer::new(request_timeout))
            .layer(CatchPanicLayer::new())
            .layer(RequestBodyLimitLayer::new(max_body));

        admin_router(state.clone())
            .fallback(webhook_handler)
            .with_state(state)
            .layer(middleware)
    }

    /// Router for in-process use (e.g. `oneshot` in tests).
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &RouterConfig {
        &self.state.config
    }

    /// Serve on `listener` until `shutdown` resolves, then drain in-flight requests.
    pub async fn run<F>(self, listener: TcpListener, shutdown: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            backends = self.state.router.registry().len(),
            routes = self.state.routes.routes().len(),
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Webhook handler: match the route, buffer the body, dispatch, relay.
async fn webhook_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let started = Instant::now();
    let client_addr = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let (parts, body) = request.into_parts();
    let path = parts.uri.path();

    let Some(matched) = state.routes.match_path(path) else {
        tracing::warn!(path = %path, "No route matched");
        metrics::record_request("none", StatusCode::NOT_FOUND.as_u16(), "none", started);
        return (StatusCode::NOT_FOUND, Json(ErrorBody::not_found(path))).into_response();
    };
    let service = matched.route.service.clone();

    let body = match to_bytes(body, state.config.listener.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::warn!(service = %service, error = %err, "Failed to read request body");
            metrics::record_request(&service, StatusCode::PAYLOAD_TOO_LARGE.as_u16(), "none", started);
            return (
                StatusCode::PAYLOAD_TOO_LARGE,
                Json(ErrorBody {
                    error: "body_rejected",
                    message: err.to_string(),
                    service: Some(service),
                    backend: None,
                    elapsed_ms: started.elapsed().as_millis() as u64,
                    upstream_error: None,
                }),
            )
                .into_response();
        }
    };

    tracing::debug!(
        service = %service,
        route = %matched.route.name,
        suffix = %matched.suffix,
        body_bytes = body.len(),
        "Dispatching webhook"
    );

    let inbound = InboundRequest::new(parts.method.clone(), path, parts.headers.clone(), body)
        .with_query(parts.uri.query())
        .with_client_addr(client_addr);
    let route = matched.route.clone();
    let suffix = matched.suffix.to_string();
    let router = state.router.clone();

    // A detached task keeps the forward alive if the caller goes away.
    let outcome = tokio::spawn(async move { router.dispatch(&route, &suffix, &inbound).await })
        .await
        .unwrap_or_else(|join_err| {
            tracing::error!(service = %service, error = %join_err, "Dispatch task failed");
            Err(RouteError::Internal {
                service: service.clone(),
                backend: None,
                elapsed: started.elapsed(),
                message: join_err.to_string(),
            })
        });

    match outcome {
        Ok(dispatched) => {
            let (status, backend) = match &dispatched {
                Dispatched::Forwarded { backend, response } => (response.status, backend.as_str()),
                Dispatched::Duplicate => (StatusCode::OK, "none"),
            };
            metrics::record_request(&service, status.as_u16(), backend, started);
            dispatched.into_response()
        }
        Err(err) => {
            metrics::record_request(
                &service,
                err.status_code().as_u16(),
                err.backend().unwrap_or("none"),
                started,
            );
            err.into_response()
        }
    }
}
