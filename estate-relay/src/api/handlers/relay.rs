use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderValue, Method};
use axum::response::{IntoResponse, Response};
use tracing::{error, info};

use crate::error::Result;
use crate::webhook::WebhookClient;

const DEFAULT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// `POST <relay path>`
///
/// Sends the body to the webhook and answers with whatever status and body
/// the webhook produced.
pub async fn forward(
    State(webhook): State<WebhookClient>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response> {
    let body_len = body.len();
    let reply = webhook
        .forward(method.clone(), headers.get(header::CONTENT_TYPE), body)
        .await
        .map_err(|e| {
            error!(%method, body_len, error = %e, "Webhook call failed");
            e
        })?;

    info!(
        %method,
        status = reply.status.as_u16(),
        body_len,
        reply_len = reply.body.len(),
        "Relayed request to webhook"
    );

    let content_type = reply
        .content_type
        .unwrap_or_else(|| HeaderValue::from_static(DEFAULT_CONTENT_TYPE));

    Ok((reply.status, [(header::CONTENT_TYPE, content_type)], reply.body).into_response())
}
