use axum::extract::State;
use serde::Serialize;

use crate::api::response::ApiResponse;
use crate::api::state::ServiceInfo;

/// Body of `GET /` on both services.
pub const LIVENESS_MESSAGE: &str = "this endpoint is for testing the server!";

/// `GET /`
pub async fn liveness() -> &'static str {
    tracing::debug!("Liveness probe");
    LIVENESS_MESSAGE
}

/// Health data returned inside the envelope.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct HealthData {
    pub status: String,
    pub service: String,
    pub version: String,
}

/// `GET /health`
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service health status", body = HealthData),
    )
)]
pub async fn health_check(State(info): State<ServiceInfo>) -> ApiResponse<HealthData> {
    ApiResponse::success(HealthData {
        status: "ok".to_string(),
        service: info.name.to_string(),
        version: info.version.to_string(),
    })
}
