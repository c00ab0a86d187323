use std::io;
use std::path::PathBuf;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";
pub const UPSTREAM_FALLBACK_MESSAGE: &str = "Upstream request failed";

/// Failures of a single proxied request
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("{param} is required")]
    MissingParameter { param: String },

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Route not found")]
    RouteNotFound,

    #[error("upstream responded {status}: {message}")]
    Upstream { status: StatusCode, message: String },

    #[error("upstream transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("malformed upstream body: {0}")]
    MalformedBody(#[from] serde_json::Error),
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::MissingParameter { .. } => StatusCode::BAD_REQUEST,
            ProxyError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ProxyError::RouteNotFound => StatusCode::NOT_FOUND,
            ProxyError::Upstream { status, .. } => *status,
            ProxyError::Transport(_) | ProxyError::MalformedBody(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Text placed in the `error` field of the response body.
    /// Transport and parse details are never exposed.
    pub fn public_message(&self) -> String {
        match self {
            ProxyError::Upstream { message, .. } => message.clone(),
            ProxyError::Transport(_) | ProxyError::MalformedBody(_) => {
                INTERNAL_ERROR_MESSAGE.to_string()
            }
            other => other.to_string(),
        }
    }

    /// Short label used for metrics
    pub fn kind(&self) -> &'static str {
        match self {
            ProxyError::MissingParameter { .. } => "missing_parameter",
            ProxyError::MethodNotAllowed => "method_not_allowed",
            ProxyError::RouteNotFound => "route_not_found",
            ProxyError::Upstream { .. } => "upstream_status",
            ProxyError::Transport(e) if e.is_timeout() => "timeout",
            ProxyError::Transport(e) if e.is_connect() => "connect",
            ProxyError::Transport(_) => "transport",
            ProxyError::MalformedBody(_) => "malformed_body",
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.public_message() }))).into_response()
    }
}

/// Failures of a key-value store backing persisted state
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O error at {path}: {source}")]
    Io { path: PathBuf, source: io::Error },

    #[error("failed to serialize value for key '{key}': {source}")]
    Serialize {
        key: String,
        source: serde_json::Error,
    },

    #[error("corrupt storage document at {path}: {source}")]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("storage lock poisoned")]
    Poisoned,
}

pub type StorageResult<T> = std::result::Result<T, StorageError>;
