use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::models::StatusBody;

pub const RATE_LIMIT_MESSAGE: &str = "Rate limit exceeded. Please try again later.";

/// Errors surfaced by the health check endpoint.
#[derive(Debug, Error)]
pub enum HealthError {
    #[error("Rate limit exceeded. Please try again later.")]
    RateLimitExceeded { retry_after: u64 },

    #[error("Connectivity check failed: {0}")]
    ConnectivityCheckFailed(String),
}

impl HealthError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            HealthError::RateLimitExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
            HealthError::ConnectivityCheckFailed(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for HealthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.to_string();
        match self {
            HealthError::RateLimitExceeded { retry_after } => (
                status,
                [(header::RETRY_AFTER, retry_after.max(1).to_string())],
                message,
            )
                .into_response(),
            HealthError::ConnectivityCheckFailed(_) => {
                (status, Json(StatusBody::error(message))).into_response()
            }
        }
    }
}

/// Counter store failures. Never reach the client: the limiter fails open.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("counter store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid slug {slug}: {reason}")]
    Slug { slug: String, reason: String },

    #[error("invalid probe url {url}: {reason}")]
    ProbeUrl { url: String, reason: String },

    #[error("failed to build http client: {0}")]
    HttpClient(#[source] reqwest::Error),

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),

    #[error("failed to initialize logging: {0}")]
    Logging(String),
}
