use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    ValidationError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Service temporarily unavailable: {0}")]
    ResourceError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    code: u16,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::ValidationError(msg) => {
                tracing::warn!(error = %msg, "Validation error");
                (StatusCode::BAD_REQUEST, msg.clone())
            }
            AppError::NotFound(msg) => {
                tracing::debug!(error = %msg, "Not found");
                (StatusCode::NOT_FOUND, msg.clone())
            }
            AppError::ConfigError(msg) => {
                tracing::error!(error = %msg, "Configuration error");
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
            AppError::ResourceError(msg) => {
                tracing::warn!(error = %msg, "Resource error");
                (StatusCode::SERVICE_UNAVAILABLE, msg.clone())
            }
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
        };

        let body = Json(ErrorResponse {
            error: message,
            code: status.as_u16(),
        });

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

/// Failure talking to an ads platform, analytics platform or the tool bridge.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlatformError {
    #[error("{0}")]
    NotConfigured(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("upstream returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("malformed upstream response: {0}")]
    Malformed(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

impl PlatformError {
    /// Classify a non-success HTTP status into the matching variant.
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            401 | 403 => PlatformError::Auth(body),
            429 => PlatformError::RateLimited(body),
            _ => PlatformError::Api { status, body },
        }
    }
}

impl From<reqwest::Error> for PlatformError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            PlatformError::Malformed(err.to_string())
        } else {
            PlatformError::Network(err.to_string())
        }
    }
}

/// Failure from an LLM provider. Never surfaced to users; the delegate
/// logs it and moves on to the next provider.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LlmError {
    #[error("provider not configured: {0}")]
    NotConfigured(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("rate limited or quota exhausted: {0}")]
    RateLimited(String),

    #[error("provider returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("malformed provider response: {0}")]
    Malformed(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

impl LlmError {
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            401 | 403 => LlmError::Auth(body),
            429 => LlmError::RateLimited(body),
            _ => LlmError::Api { status, body },
        }
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            LlmError::Malformed(err.to_string())
        } else {
            LlmError::Network(err.to_string())
        }
    }
}
