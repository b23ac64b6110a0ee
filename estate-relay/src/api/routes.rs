use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers::{extraction, health, relay};
use super::openapi;
use super::{ExtractionState, RelayState};

fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
}

pub fn create_relay_router(state: RelayState) -> Router {
    let max_body = state.config.webhook.max_body_bytes;

    Router::new()
        .route("/", get(health::liveness))
        .route("/health", get(health::health_check))
        .route(&state.config.webhook.path, post(relay::forward))
        .layer(DefaultBodyLimit::max(max_body))
        .layer(cors())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub fn create_extraction_router(state: ExtractionState) -> Router {
    let max_upload = state.config.max_upload_bytes;
    let docs = openapi::redoc_router(openapi::api_doc(&state.config.path));

    Router::new()
        .route("/", get(health::liveness))
        .route("/health", get(health::health_check))
        .route("/openapi.json", get(openapi::openapi_json))
        .route(&state.config.path, post(extraction::extract_document))
        .merge(docs)
        .layer(DefaultBodyLimit::max(max_upload))
        .layer(cors())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
