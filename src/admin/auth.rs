use axum::{
    body::Body,
    extract::State,
    http::{header::AUTHORIZATION, Request, StatusCode},
    middleware::Next,
    response::Response,
};

use crate::http::server::AppState;

/// Require `Authorization: Bearer <admin.api_key>` when a key is configured.
pub async fn admin_auth_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(expected) = state.config.admin.api_key.as_deref() else {
        return Ok(next.run(request).await);
    };

    let presented = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    if presented == Some(expected) {
        return Ok(next.run(request).await);
    }

    tracing::warn!(path = %request.uri().path(), "Rejected admin request");
    Err(StatusCode::UNAUTHORIZED)
}
