use axum::{http::StatusCode, response::{IntoResponse, Response}};
use reqwest::Error;
use std::{fmt, path::PathBuf};

/// Failures while turning the mock configuration into a rule list.
///
/// Every variant aborts the compile attempt it occurred in. The reload
/// controller reports it and keeps serving, it never reaches the host.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MockError {
    #[error("mock value of {key} should be function or object or string, but got {found}")]
    ConfigType { key: String, found: String },

    #[error("invalid route key {key}: {reason}")]
    InvalidRouteKey { key: String, reason: String },

    #[error("{}: {message}", path.display())]
    ConfigLoad { path: PathBuf, message: String },
}

impl MockError {
    pub fn config_type(key: impl Into<String>, found: impl Into<String>) -> Self {
        MockError::ConfigType { key: key.into(), found: found.into() }
    }

    pub fn invalid_route_key(key: impl Into<String>, reason: impl fmt::Display) -> Self {
        MockError::InvalidRouteKey { key: key.into(), reason: reason.to_string() }
    }

    pub fn config_load(path: impl Into<PathBuf>, message: impl fmt::Display) -> Self {
        MockError::ConfigLoad { path: path.into(), message: message.to_string() }
    }
}

/// Errors surfaced by the dev server itself, outside of mock handling.
#[derive(Debug)]
pub enum AppError {
    // Fall-through errors
    NoUpstream,
    UpstreamError(Error),
    InvalidUpstream(String),
    /// The request body failed mid-stream and cannot be forwarded.
    UnreadableBody,
    InternalServerError,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::NoUpstream => (StatusCode::NOT_FOUND, "Not Found".to_string()),
            AppError::UpstreamError(e) => {
                tracing::error!("Upstream error: {}", e);
                (StatusCode::BAD_GATEWAY, "Error proxying request".to_string())
            }
            AppError::InvalidUpstream(url) => {
                tracing::error!("Invalid upstream URL configured: {}", url);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Invalid dev server configuration".to_string(),
                )
            }
            AppError::UnreadableBody => (StatusCode::BAD_REQUEST, "Request body could not be read".to_string()),
            AppError::InternalServerError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "An internal server error occurred".to_string(),
            ),
        };

        (status, error_message).into_response()
    }
}

impl From<reqwest::Error> for AppError {
    fn from(error: reqwest::Error) -> Self {
        AppError::UpstreamError(error)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::NoUpstream => write!(f, "No upstream configured"),
            AppError::UpstreamError(_) => write!(f, "Upstream error"),
            AppError::InvalidUpstream(url) => write!(f, "Invalid upstream: {}", url),
            AppError::UnreadableBody => write!(f, "Unreadable request body"),
            AppError::InternalServerError => write!(f, "Internal server error"),
        }
    }
}
