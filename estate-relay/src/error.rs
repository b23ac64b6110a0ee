use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::api::response::{ApiResponse, ErrorCode};

/// Fixed message returned when an assistant run ends in a failure state.
pub const RUN_FAILED_MESSAGE: &str = "Assistant run failed";

#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Upstream request to {endpoint} failed: {message}")]
    Transport { endpoint: String, message: String },

    #[error("Upstream {endpoint} rejected the request with {status}: {body}")]
    UpstreamRejected {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("Invalid response from {endpoint}: {message}")]
    InvalidResponse { endpoint: String, message: String },

    #[error("Assistant run {run_id} ended with status {status}{}", detail_suffix(.last_error))]
    RunFailed {
        run_id: String,
        status: String,
        last_error: Option<String>,
    },

    #[error("Assistant run {run_id} did not finish within {waited_secs} seconds")]
    RunTimeout { run_id: String, waited_secs: u64 },

    #[error("File batch {batch_id} ended with status {status}")]
    IndexingFailed { batch_id: String, status: String },

    #[error("File batch {batch_id} was not indexed within {waited_secs} seconds")]
    IndexingTimeout { batch_id: String, waited_secs: u64 },

    #[error("Extraction cancelled before completion")]
    Cancelled,

    #[error("Webhook request failed: {0}")]
    Webhook(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

fn detail_suffix(detail: &Option<String>) -> String {
    detail
        .as_deref()
        .map(|d| format!(": {d}"))
        .unwrap_or_default()
}

impl RelayError {
    /// Classify a reqwest failure that happened before a status was received.
    pub fn transport(endpoint: impl Into<String>, error: reqwest::Error) -> Self {
        let message = if error.is_timeout() {
            "request timed out".to_string()
        } else if error.is_connect() {
            format!("connection failed: {error}")
        } else {
            error.to_string()
        };
        Self::Transport {
            endpoint: endpoint.into(),
            message,
        }
    }

    /// Machine-readable code this error is reported under.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Validation(_) => ErrorCode::InvalidRequest,
            Self::Transport { .. } => ErrorCode::UpstreamUnavailable,
            Self::UpstreamRejected { .. } | Self::IndexingFailed { .. } => {
                ErrorCode::UpstreamRejected
            }
            Self::InvalidResponse { .. } => ErrorCode::InvalidUpstreamResponse,
            Self::RunFailed { .. } => ErrorCode::RunFailed,
            Self::RunTimeout { .. } => ErrorCode::RunTimeout,
            Self::IndexingTimeout { .. } => ErrorCode::IndexingTimeout,
            Self::Cancelled => ErrorCode::Cancelled,
            Self::Webhook(_) => ErrorCode::WebhookUnavailable,
            Self::Config(_) | Self::Json(_) | Self::Io(_) | Self::Internal(_) => {
                ErrorCode::InternalError
            }
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        ApiResponse::<()>::from(self).into_response()
    }
}

pub type Result<T> = std::result::Result<T, RelayError>;
