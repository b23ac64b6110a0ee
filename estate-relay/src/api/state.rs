use std::sync::Arc;

use axum::extract::FromRef;
use tokio_util::sync::CancellationToken;

use crate::assistants::AssistantPlatform;
use crate::config::{ExtractionConfig, RelayConfig};
use crate::error::{RelayError, Result};
use crate::extraction::ExtractionOrchestrator;
use crate::webhook::WebhookClient;

/// Name and version reported by `GET /health`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceInfo {
    pub name: &'static str,
    pub version: &'static str,
}

impl ServiceInfo {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            version: env!("CARGO_PKG_VERSION"),
        }
    }
}

#[derive(Clone, FromRef)]
pub struct RelayState {
    pub config: Arc<RelayConfig>,
    pub webhook: WebhookClient,
    pub info: ServiceInfo,
}

impl RelayState {
    pub fn new(config: RelayConfig) -> Result<Self> {
        let webhook = WebhookClient::new(&config.webhook)?;
        Ok(Self {
            config: Arc::new(config),
            webhook,
            info: ServiceInfo::new("webhook-relay"),
        })
    }
}

#[derive(Clone, FromRef)]
pub struct ExtractionState {
    pub config: Arc<ExtractionConfig>,
    pub orchestrator: Arc<ExtractionOrchestrator>,
    /// Parent of every per-request token; cancelled on shutdown.
    pub shutdown: CancellationToken,
    pub info: ServiceInfo,
}

impl ExtractionState {
    pub fn new(
        config: ExtractionConfig,
        platform: Arc<dyn AssistantPlatform>,
        shutdown: CancellationToken,
    ) -> Result<Self> {
        let assistant_id = config
            .platform
            .assistant_id
            .clone()
            .ok_or_else(|| RelayError::Config("ASSISTANT_ID is not set".to_string()))?;
        let orchestrator = ExtractionOrchestrator::new(platform, assistant_id, config.run.clone());

        Ok(Self {
            config: Arc::new(config),
            orchestrator: Arc::new(orchestrator),
            shutdown,
            info: ServiceInfo::new("extraction-service"),
        })
    }
}
