use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use tracing::{error, info_span, Instrument};
use uuid::Uuid;

use crate::api::state::ExtractionState;
use crate::error::{RelayError, Result};
use crate::extraction::Upload;

const FILE_FIELD: &str = "file";

/// Multipart body accepted by the extraction endpoint.
#[derive(utoipa::ToSchema)]
#[allow(dead_code)]
pub struct ExtractionUpload {
    /// The offering document to analyse.
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
}

/// `POST <extraction path>`
///
/// Documented under the default `/extract`; [`crate::api::openapi::api_doc`]
/// moves it to the configured path. The orchestration runs in its own task. Dropping this handler (client
/// disconnect) cancels it, and so does server shutdown.
#[utoipa::path(
    post,
    path = "/extract",
    tag = "extraction",
    request_body(content_type = "multipart/form-data", content = ExtractionUpload, description = "Document to extract in the `file` field"),
    responses(
        (status = 200, description = "Raw assistant reply", body = String, content_type = "text/plain"),
        (status = 422, description = "Invalid upload or platform error", body = crate::api::response::ErrorBody),
        (status = 500, description = "Assistant run failed", body = crate::api::response::ErrorBody),
        (status = 503, description = "Cancelled by shutdown", body = crate::api::response::ErrorBody),
        (status = 504, description = "Run or indexing deadline exceeded", body = crate::api::response::ErrorBody),
    )
)]
pub async fn extract_document(
    State(state): State<ExtractionState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Response {
    let upload = match read_upload(multipart).await {
        Ok(upload) => upload,
        Err(e) => {
            error!(step = "read_upload", error = %e, "Rejected extraction request");
            return e.into_response();
        }
    };

    let request_id = Uuid::new_v4();
    let span = info_span!(
        "extraction",
        %request_id,
        file_name = %upload.file_name,
        bytes = upload.len()
    );

    let cancel = state.shutdown.child_token();
    let _guard = cancel.clone().drop_guard();
    let orchestrator = state.orchestrator.clone();
    let task =
        tokio::spawn(async move { orchestrator.extract(upload, cancel).await }.instrument(span));

    match task.await {
        Ok(Ok(reply)) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            reply,
        )
            .into_response(),
        Ok(Err(e)) => e.into_response(),
        Err(e) => RelayError::Internal(format!("extraction task failed: {e}")).into_response(),
    }
}

/// Pull the `file` field out of the multipart body. Other fields are ignored.
async fn read_upload(multipart: std::result::Result<Multipart, MultipartRejection>) -> Result<Upload> {
    let mut multipart = multipart.map_err(|e| {
        RelayError::Validation(format!("Expected a multipart/form-data body: {}", e.body_text()))
    })?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| RelayError::Validation(format!("Could not read upload: {}", e.body_text())))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| RelayError::Validation(format!("Could not read upload: {}", e.body_text())))?;

        if bytes.is_empty() {
            return Err(RelayError::Validation("Uploaded file is empty".to_string()));
        }
        return Ok(Upload::new(bytes, file_name, content_type));
    }

    Err(RelayError::Validation(format!(
        "Missing multipart field '{FILE_FIELD}'"
    )))
}
