use axum::extract::State;
use axum::http::{header::CONTENT_TYPE, HeaderMap, HeaderValue, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::{any, get};
use axum::{Json, Router};
use std::sync::Arc;
use std::time::Instant;
use url::form_urlencoded;

use crate::config::{Config, Route};
use crate::error::ProxyError;
use crate::health;
use crate::metrics::Metrics;
use crate::proxy::{forward_request, ForwardedRequest};

pub struct AppState {
    pub config: Config,
    pub http_client: reqwest::Client,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(config: Config, metrics: Arc<Metrics>) -> Result<Self, String> {
        let http_client = build_http_client(&config)?;
        Ok(Self {
            config,
            http_client,
            metrics,
        })
    }
}

/// Build a reqwest client suitable for the gateway.
/// System proxy lookups are disabled to avoid platform-specific panics in tests.
pub fn build_http_client(config: &Config) -> Result<reqwest::Client, String> {
    let mut builder = reqwest::Client::builder().no_proxy();
    if let Some(timeout) = config.upstream.timeout() {
        builder = builder.timeout(timeout);
    }
    builder
        .build()
        .map_err(|e| format!("Failed to build HTTP client: {}", e))
}

/// Router with health, metrics and the catch-all proxy handler
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .route("/metrics", get(metrics_handler))
        .route("/*path", any(handle_request))
        .with_state(state)
}

/// Main request handler for proxied routes
pub async fn handle_request(
    State(state): State<Arc<AppState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    let path = uri.path().to_string();

    let route = match state.config.find_route(&path) {
        Some(r) => r,
        None => {
            tracing::debug!(method = %method, path = %path, "Route not found");
            return reject(&state, &path, ProxyError::RouteNotFound);
        }
    };

    if method != Method::GET {
        tracing::debug!(method = %method, path = %path, "Method not allowed");
        return reject(&state, &route.path, ProxyError::MethodNotAllowed);
    }

    let query = match extract_required_params(route, uri.query()) {
        Ok(q) => q,
        Err(e) => {
            tracing::debug!(path = %path, error = %e, "Rejecting request");
            return reject(&state, &route.path, e);
        }
    };

    let forwarded = ForwardedRequest::new(route.upstream_path(), query, &headers);
    proxy_to_upstream(&state, &route.path, forwarded).await
}

async fn proxy_to_upstream(state: &AppState, route_label: &str, forwarded: ForwardedRequest) -> Response {
    let start_time = Instant::now();
    let result = forward_request(
        &state.http_client,
        &state.config.upstream.base_url,
        &forwarded,
    )
    .await;
    state
        .metrics
        .upstream_request_duration_seconds
        .with_label_values(&[route_label])
        .observe(start_time.elapsed().as_secs_f64());

    let response = match result {
        Ok(reply) => {
            state
                .metrics
                .upstream_requests_total
                .with_label_values(&[reply.status.as_str()])
                .inc();
            (reply.status, Json(reply.body)).into_response()
        }
        Err(e) => {
            match &e {
                ProxyError::Upstream { status, message } => {
                    tracing::warn!(
                        path = %forwarded.path,
                        status = %status,
                        message = %message,
                        "Upstream returned an error"
                    );
                    state
                        .metrics
                        .upstream_requests_total
                        .with_label_values(&[status.as_str()])
                        .inc();
                }
                other => {
                    tracing::error!(
                        path = %forwarded.path,
                        error = %other,
                        "Upstream request failed"
                    );
                }
            }
            state
                .metrics
                .upstream_errors_total
                .with_label_values(&[e.kind()])
                .inc();
            e.into_response()
        }
    };

    state
        .metrics
        .proxy_requests_total
        .with_label_values(&[route_label, response.status().as_str()])
        .inc();
    response
}

fn reject(state: &AppState, route_label: &str, error: ProxyError) -> Response {
    state
        .metrics
        .proxy_rejections_total
        .with_label_values(&[error.kind()])
        .inc();
    let label = match error {
        ProxyError::RouteNotFound => "not_found",
        _ => route_label,
    };
    let response = error.into_response();
    state
        .metrics
        .proxy_requests_total
        .with_label_values(&[label, response.status().as_str()])
        .inc();
    response
}

/// Pick the route's required parameters out of the raw query string.
/// The first occurrence wins; a present but empty value counts as missing.
fn extract_required_params(
    route: &Route,
    query: Option<&str>,
) -> Result<Vec<(String, String)>, ProxyError> {
    let pairs: Vec<(String, String)> = query
        .map(|q| {
            form_urlencoded::parse(q.as_bytes())
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect()
        })
        .unwrap_or_default();

    route
        .required_params
        .iter()
        .map(|param| {
            pairs
                .iter()
                .find(|(k, v)| k == param && !v.is_empty())
                .map(|(k, v)| (k.clone(), v.clone()))
                .ok_or_else(|| ProxyError::MissingParameter {
                    param: param.clone(),
                })
        })
        .collect()
}

async fn metrics_handler(State(state): State<Arc<AppState>>) -> Response {
    match state.metrics.gather() {
        Ok(body) => {
            let mut response = body.into_response();
            response.headers_mut().insert(
                CONTENT_TYPE,
                HeaderValue::from_static("text/plain; version=0.0.4"),
            );
            response
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to gather metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to gather metrics").into_response()
        }
    }
}
