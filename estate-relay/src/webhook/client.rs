use std::time::Duration;

use axum::body::Bytes;
use axum::http::{HeaderValue, Method, StatusCode};
use reqwest::Client;
use tracing::debug;

use crate::{
    config::WebhookConfig,
    error::{RelayError, Result},
};

/// What the webhook answered, copied back to the caller unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamReply {
    pub status: StatusCode,
    pub content_type: Option<HeaderValue>,
    pub body: String,
}

/// Forwards request bodies to the configured workflow webhook.
#[derive(Debug, Clone)]
pub struct WebhookClient {
    client: Client,
    url: String,
}

impl WebhookClient {
    pub fn new(config: &WebhookConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| RelayError::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            url: config.url.clone(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Send `body` to the webhook with the caller's method and content type.
    ///
    /// Non-success statuses are not errors here: they are part of the reply
    /// the relay hands back verbatim.
    pub async fn forward(
        &self,
        method: Method,
        content_type: Option<&HeaderValue>,
        body: Bytes,
    ) -> Result<UpstreamReply> {
        debug!(%method, url = %self.url, body_len = body.len(), "Forwarding to webhook");

        let mut request = self.client.request(method, &self.url).body(body);
        if let Some(content_type) = content_type {
            request = request.header(reqwest::header::CONTENT_TYPE, content_type.clone());
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                RelayError::Webhook("Request timeout".to_string())
            } else {
                RelayError::Webhook(format!("Request failed: {e}"))
            }
        })?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .cloned();
        let body = response
            .text()
            .await
            .map_err(|e| RelayError::Webhook(format!("Failed to read webhook response: {e}")))?;

        debug!(%status, body_len = body.len(), "Webhook responded");

        Ok(UpstreamReply {
            status,
            content_type,
            body,
        })
    }
}
