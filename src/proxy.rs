use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, StatusCode};
use reqwest::Client;
use serde_json::Value;

use crate::error::{ProxyError, UPSTREAM_FALLBACK_MESSAGE};

/// One outbound call to the upstream, alive for the duration of a single request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardedRequest {
    pub path: String,
    pub query: Vec<(String, String)>,
    pub authorization: Option<Vec<u8>>,
}

impl ForwardedRequest {
    /// Capture the credential from inbound headers, copied verbatim
    pub fn new(path: impl Into<String>, query: Vec<(String, String)>, headers: &HeaderMap) -> Self {
        let authorization = headers
            .get(AUTHORIZATION)
            .map(|value| value.as_bytes().to_vec());

        Self {
            path: path.into(),
            query,
            authorization,
        }
    }

    pub fn url(&self, base_url: &str) -> String {
        format!("{}{}", base_url.trim_end_matches('/'), self.path)
    }
}

/// Successful upstream reply: status plus the opaque JSON payload
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamReply {
    pub status: StatusCode,
    pub body: Value,
}

/// Forward a GET to the upstream and relay its JSON body.
///
/// Non-2xx replies become [`ProxyError::Upstream`] carrying the upstream status and
/// body text. There is no retry.
pub async fn forward_request(
    client: &Client,
    base_url: &str,
    request: &ForwardedRequest,
) -> Result<UpstreamReply, ProxyError> {
    let url = request.url(base_url);

    let mut builder = client
        .get(&url)
        .query(&request.query)
        .header(reqwest::header::CONTENT_TYPE, "application/json");

    // reqwest and axum sit on different `http` versions; rebuild from raw bytes
    if let Some(credential) = &request.authorization {
        match reqwest::header::HeaderValue::from_bytes(credential) {
            Ok(value) => builder = builder.header(reqwest::header::AUTHORIZATION, value),
            Err(e) => tracing::warn!(error = %e, "Authorization header not forwardable"),
        }
    }

    tracing::debug!(
        url = %url,
        params = ?request.query,
        authorized = request.authorization.is_some(),
        "Forwarding to upstream"
    );

    let response = builder.send().await?;
    let status = StatusCode::from_u16(response.status().as_u16())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    if !status.is_success() {
        let text = response.text().await?;
        let message = if text.is_empty() {
            UPSTREAM_FALLBACK_MESSAGE.to_string()
        } else {
            text
        };
        return Err(ProxyError::Upstream { status, message });
    }

    let bytes = response.bytes().await?;
    let body: Value = serde_json::from_slice(&bytes)?;

    Ok(UpstreamReply { status, body })
}
