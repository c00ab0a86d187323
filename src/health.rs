use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use std::sync::Arc;

use crate::handler::AppState;

/// Basic health check endpoint
pub async fn health() -> Response {
    (StatusCode::OK, "OK").into_response()
}

/// Liveness probe endpoint
pub async fn liveness() -> Response {
    (StatusCode::OK, "Alive").into_response()
}

/// Readiness probe endpoint.
/// Ready once an upstream is configured and at least one route is served.
pub async fn readiness(State(state): State<Arc<AppState>>) -> Response {
    if state.config.upstream.base_url.is_empty() {
        return (StatusCode::SERVICE_UNAVAILABLE, "No upstream configured").into_response();
    }

    if state.config.routes.is_empty() {
        return (StatusCode::SERVICE_UNAVAILABLE, "No routes configured").into_response();
    }

    (StatusCode::OK, "Ready").into_response()
}
