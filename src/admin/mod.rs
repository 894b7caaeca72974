pub mod auth;
pub mod handlers;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use self::auth::admin_auth_middleware;
use self::handlers::{health, load_balancer, reset_health};
use crate::http::server::AppState;

/// Admin routes. Only the mutating reset is behind the optional API key.
pub fn admin_router(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/reset-health", post(reset_health))
        .route_layer(middleware::from_fn_with_state(state, admin_auth_middleware));

    Router::new()
        .route("/health", get(health))
        .route("/load-balancer", get(load_balancer))
        .merge(protected)
}
