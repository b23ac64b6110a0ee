//! # Response Envelope & Error Contract
//!
//! JSON endpoints and every error path return an [`ApiResponse<T>`] envelope:
//!
//! ```json
//! {
//!   "data": { ... },                                   // present on success
//!   "error": { "code": "run_failed", "message": "..." } // present on error
//! }
//! ```
//!
//! Successful extraction replies and relayed webhook bodies are passed through
//! as plain text and do not use the envelope.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::{RelayError, RUN_FAILED_MESSAGE};

/// Machine-readable error code included in every error response.
///
/// Serialized as a snake_case string on the wire (e.g. `"upstream_rejected"`).
/// Each variant maps to a fixed HTTP status code via [`ErrorCode::status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// The upload was missing or unreadable. HTTP 422.
    InvalidRequest,
    /// The assistant platform could not be reached. HTTP 422.
    UpstreamUnavailable,
    /// The assistant platform answered with a non-success status. HTTP 422.
    UpstreamRejected,
    /// The assistant platform answered with a body we could not use. HTTP 422.
    InvalidUpstreamResponse,
    /// The assistant run reached a failure state. HTTP 500.
    RunFailed,
    /// The assistant run did not finish before the poll deadline. HTTP 504.
    RunTimeout,
    /// The uploaded file was not indexed before the poll deadline. HTTP 504.
    IndexingTimeout,
    /// The extraction was cancelled by shutdown. HTTP 503.
    Cancelled,
    /// The relay could not reach the webhook. HTTP 502.
    WebhookUnavailable,
    /// An unexpected server-side error occurred. Internal details are never
    /// leaked to the client. HTTP 500.
    InternalError,
}

impl ErrorCode {
    /// Returns the HTTP status code corresponding to this error code.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidRequest
            | Self::UpstreamUnavailable
            | Self::UpstreamRejected
            | Self::InvalidUpstreamResponse => StatusCode::UNPROCESSABLE_ENTITY,
            Self::RunFailed => StatusCode::INTERNAL_SERVER_ERROR,
            Self::RunTimeout | Self::IndexingTimeout => StatusCode::GATEWAY_TIMEOUT,
            Self::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
            Self::WebhookUnavailable => StatusCode::BAD_GATEWAY,
            Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidRequest => write!(f, "invalid_request"),
            Self::UpstreamUnavailable => write!(f, "upstream_unavailable"),
            Self::UpstreamRejected => write!(f, "upstream_rejected"),
            Self::InvalidUpstreamResponse => write!(f, "invalid_upstream_response"),
            Self::RunFailed => write!(f, "run_failed"),
            Self::RunTimeout => write!(f, "run_timeout"),
            Self::IndexingTimeout => write!(f, "indexing_timeout"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::WebhookUnavailable => write!(f, "webhook_unavailable"),
            Self::InternalError => write!(f, "internal_error"),
        }
    }
}

/// Structured error payload within the envelope.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ApiError {
    /// Machine-readable error classification.
    pub code: ErrorCode,
    /// Human-readable description safe to display to end users.
    pub message: String,
}

/// Shape of an error envelope, for the OpenAPI document.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ErrorBody {
    pub error: ApiError,
}

/// Canonical response envelope. On success `data` is present and `error`
/// absent; on error the reverse.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,

    /// HTTP status to use in the response. Not serialized on the wire.
    #[serde(skip)]
    status: StatusCode,
}

impl<T: Serialize> ApiResponse<T> {
    /// Success response with data (HTTP 200).
    pub fn success(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
            status: StatusCode::OK,
        }
    }

    /// Error response. HTTP status is derived from the [`ErrorCode`].
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        let status = code.status();
        Self {
            data: None,
            error: Some(ApiError {
                code,
                message: message.into(),
            }),
            status,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = self.status;
        match serde_json::to_value(&self) {
            Ok(body) => (status, Json(body)).into_response(),
            Err(_) => {
                let body = serde_json::json!({
                    "error": {
                        "code": "internal_error",
                        "message": "An internal error occurred"
                    }
                });
                (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
            }
        }
    }
}

impl<T: Serialize> From<RelayError> for ApiResponse<T> {
    /// Convert a [`RelayError`] into an envelope.
    ///
    /// Upstream bodies and internal details stay in the logs; the client only
    /// sees which step failed and how.
    fn from(err: RelayError) -> Self {
        let code = err.code();
        match err {
            RelayError::Validation(msg) => ApiResponse::error(code, msg),

            RelayError::Transport { endpoint, .. } => {
                ApiResponse::error(code, format!("Could not reach the assistant platform ({endpoint})"))
            }

            RelayError::UpstreamRejected {
                endpoint, status, ..
            } => ApiResponse::error(
                code,
                format!("Assistant platform rejected {endpoint} with status {status}"),
            ),

            RelayError::InvalidResponse { endpoint, .. } => ApiResponse::error(
                code,
                format!("Assistant platform returned an unusable response ({endpoint})"),
            ),

            RelayError::IndexingFailed { status, .. } => ApiResponse::error(
                code,
                format!("Assistant platform could not index the upload (status {status})"),
            ),

            RelayError::IndexingTimeout { waited_secs, .. } => ApiResponse::error(
                code,
                format!("Upload was not indexed within {waited_secs} seconds"),
            ),

            RelayError::RunFailed { .. } => ApiResponse::error(code, RUN_FAILED_MESSAGE),

            RelayError::RunTimeout { waited_secs, .. } => ApiResponse::error(
                code,
                format!("Assistant run did not finish within {waited_secs} seconds"),
            ),

            RelayError::Cancelled => ApiResponse::error(code, "Extraction was cancelled"),

            RelayError::Webhook(_) => ApiResponse::error(code, "Webhook could not be reached"),

            ref internal @ (RelayError::Config(_)
            | RelayError::Json(_)
            | RelayError::Io(_)
            | RelayError::Internal(_)) => {
                tracing::error!(error = %internal, "Internal error mapped to response");
                ApiResponse::error(code, "An internal error occurred")
            }
        }
    }
}
