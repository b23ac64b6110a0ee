use serde::Deserialize;
use std::env;
use std::time::Duration;

use crate::error::{RelayError, Result};

pub const DEFAULT_WEBHOOK_URL: &str =
    "https://n8n.srv805351.hstgr.cloud/webhook-test/real-estate-upload";
pub const DEFAULT_RELAY_PATH: &str = "/my-n8n-endpoint";
pub const DEFAULT_EXTRACTION_PATH: &str = "/extract";
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const OPENAI_BETA_ASSISTANTS: &str = "assistants=v2";

fn parse_env_or<T: std::str::FromStr>(var: &str, default: T) -> T
where
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(val) => match val.parse() {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Invalid value '{}' for {}: {}. Using default.", val, var, e);
                default
            }
        },
        Err(_) => default,
    }
}

fn parse_env_opt<T: std::str::FromStr>(var: &str) -> Option<T>
where
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(val) => match val.parse() {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                tracing::warn!("Invalid value '{}' for {}: {}. Ignoring.", val, var, e);
                None
            }
        },
        Err(_) => None,
    }
}

fn env_non_empty(var: &str) -> Option<String> {
    env::var(var)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Normalize a route path so it always starts with a single `/`.
fn normalize_path(path: String) -> String {
    let trimmed = path.trim().trim_start_matches('/');
    format!("/{trimmed}")
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    fn from_env(default_port: u16) -> Self {
        Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parse_env_or("PORT", default_port),
        }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Configuration for the webhook relay binary.
#[derive(Debug, Clone, Deserialize)]
pub struct RelayConfig {
    pub server: ServerConfig,
    pub webhook: WebhookConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookConfig {
    pub url: String,
    pub path: String,
    /// `None` keeps the outbound call unbounded.
    pub timeout_secs: Option<u64>,
    pub max_body_bytes: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::from_env(3000),
            webhook: WebhookConfig {
                url: env::var("N8N_WEBHOOK_URL").unwrap_or_else(|_| DEFAULT_WEBHOOK_URL.to_string()),
                path: normalize_path(
                    env::var("RELAY_PATH").unwrap_or_else(|_| DEFAULT_RELAY_PATH.to_string()),
                ),
                timeout_secs: parse_env_opt("RELAY_TIMEOUT_SECS"),
                max_body_bytes: parse_env_or("RELAY_MAX_BODY_BYTES", 10 * 1024 * 1024),
            },
        }
    }
}

impl RelayConfig {
    pub fn from_env() -> Self {
        Self::default()
    }
}

/// Where the file-search tool gets bound to the request's vector store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolBinding {
    /// Bind through the thread's `tool_resources`; the shared assistant is left untouched.
    Thread,
    /// Rewrite the shared assistant's `tool_resources` on every request.
    Assistant,
}

impl std::str::FromStr for ToolBinding {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "thread" => Ok(Self::Thread),
            "assistant" => Ok(Self::Assistant),
            other => Err(format!("unknown tool binding '{other}' (expected thread|assistant)")),
        }
    }
}

impl std::fmt::Display for ToolBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Thread => write!(f, "thread"),
            Self::Assistant => write!(f, "assistant"),
        }
    }
}

/// Configuration for the extraction service binary.
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractionConfig {
    pub server: ServerConfig,
    pub platform: PlatformConfig,
    pub run: RunConfig,
    pub path: String,
    pub max_upload_bytes: usize,
}

/// Credentials and endpoint of the assistant platform.
#[derive(Debug, Clone, Deserialize)]
pub struct PlatformConfig {
    pub api_key: Option<String>,
    pub assistant_id: Option<String>,
    pub base_url: String,
    pub beta_header: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RunConfig {
    pub poll_interval_ms: u64,
    pub poll_timeout_secs: u64,
    pub tool_binding: ToolBinding,
    pub await_indexing: bool,
    pub cleanup: bool,
}

impl RunConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_secs(self.poll_timeout_secs)
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 2000,
            poll_timeout_secs: 300,
            tool_binding: ToolBinding::Thread,
            await_indexing: true,
            cleanup: true,
        }
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        let run_defaults = RunConfig::default();
        Self {
            server: ServerConfig::from_env(5000),
            platform: PlatformConfig {
                api_key: env_non_empty("OPENAI_API_KEY"),
                assistant_id: env_non_empty("ASSISTANT_ID"),
                base_url: env::var("OPENAI_BASE_URL")
                    .map(|url| url.trim_end_matches('/').to_string())
                    .unwrap_or_else(|_| OPENAI_BASE_URL.to_string()),
                beta_header: env::var("OPENAI_BETA")
                    .unwrap_or_else(|_| OPENAI_BETA_ASSISTANTS.to_string()),
                timeout_secs: parse_env_or("PLATFORM_TIMEOUT_SECS", 60),
            },
            run: RunConfig {
                poll_interval_ms: parse_env_or("RUN_POLL_INTERVAL_MS", run_defaults.poll_interval_ms),
                poll_timeout_secs: parse_env_or(
                    "RUN_POLL_TIMEOUT_SECS",
                    run_defaults.poll_timeout_secs,
                ),
                tool_binding: parse_env_or("ASSISTANT_TOOL_BINDING", run_defaults.tool_binding),
                await_indexing: parse_env_or("EXTRACTION_AWAIT_INDEXING", run_defaults.await_indexing),
                cleanup: parse_env_or("EXTRACTION_CLEANUP", run_defaults.cleanup),
            },
            path: normalize_path(
                env::var("EXTRACTION_PATH").unwrap_or_else(|_| DEFAULT_EXTRACTION_PATH.to_string()),
            ),
            max_upload_bytes: parse_env_or("MAX_UPLOAD_BYTES", 50 * 1024 * 1024),
        }
    }
}

impl ExtractionConfig {
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Fail fast when the settings the orchestrator cannot run without are missing.
    pub fn validate(&self) -> Result<()> {
        if self.platform.api_key.is_none() {
            return Err(RelayError::Config(
                "OPENAI_API_KEY is required for the extraction service".to_string(),
            ));
        }
        if self.platform.assistant_id.is_none() {
            return Err(RelayError::Config(
                "ASSISTANT_ID is required for the extraction service".to_string(),
            ));
        }
        if self.run.poll_interval_ms == 0 {
            return Err(RelayError::Config(
                "RUN_POLL_INTERVAL_MS must be greater than zero".to_string(),
            ));
        }
        if self.run.poll_timeout_secs == 0 {
            return Err(RelayError::Config(
                "RUN_POLL_TIMEOUT_SECS must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
