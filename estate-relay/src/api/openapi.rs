use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use utoipa::OpenApi;
use utoipa_redoc::{Redoc, Servable};

use super::handlers;
use super::response;
use crate::config::ExtractionConfig;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Estate Extraction API",
        version = "0.1.0",
        description = "Extracts structured financial data from real-estate offering documents using a hosted assistant.",
    ),
    paths(
        handlers::health::health_check,
        handlers::extraction::extract_document,
    ),
    components(schemas(
        response::ErrorCode,
        response::ApiError,
        response::ErrorBody,
        handlers::health::HealthData,
        handlers::extraction::ExtractionUpload,
    )),
    tags(
        (name = "health", description = "Health check"),
        (name = "extraction", description = "Document extraction"),
    ),
)]
pub struct ApiDoc;

/// Path the extraction handler is documented under in [`ApiDoc`].
const DOCUMENTED_EXTRACTION_PATH: &str = "/extract";

/// The API document with the extraction operation moved to the route it is
/// actually served on.
pub fn api_doc(extraction_path: &str) -> utoipa::openapi::OpenApi {
    let mut doc = ApiDoc::openapi();
    if extraction_path != DOCUMENTED_EXTRACTION_PATH {
        if let Some(item) = doc.paths.paths.remove(DOCUMENTED_EXTRACTION_PATH) {
            doc.paths.paths.insert(extraction_path.to_string(), item);
        }
    }
    doc
}

pub async fn openapi_json(
    State(config): State<Arc<ExtractionConfig>>,
) -> Json<utoipa::openapi::OpenApi> {
    Json(api_doc(&config.path))
}

pub fn redoc_router<S: Clone + Send + Sync + 'static>(
    doc: utoipa::openapi::OpenApi,
) -> axum::Router<S> {
    Redoc::with_url("/docs", doc).into()
}
