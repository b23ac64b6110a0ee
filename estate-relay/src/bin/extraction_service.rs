use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio_util::sync::CancellationToken;

use estate_relay::api::{create_extraction_router, ExtractionState};
use estate_relay::assistants::{AssistantPlatform, AssistantsClient};
use estate_relay::config::ExtractionConfig;
use estate_relay::server;

#[derive(Parser)]
#[command(name = "extraction-service")]
#[command(about = "Extracts financial data from real-estate documents with a hosted assistant")]
struct Args {
    /// Address to bind (overrides HOST)
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on (overrides PORT)
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    dotenvy::dotenv().ok();
    server::init_tracing();

    let mut config = ExtractionConfig::from_env();
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    config
        .validate()
        .context("invalid extraction service configuration")?;

    tracing::info!(
        "Assistant platform: {} (binding={}, poll every {}ms, give up after {}s)",
        config.platform.base_url,
        config.run.tool_binding,
        config.run.poll_interval_ms,
        config.run.poll_timeout_secs
    );
    let platform: Arc<dyn AssistantPlatform> = Arc::new(AssistantsClient::new(&config.platform)?);

    let addr = config.server.addr();
    let path = config.path.clone();
    let cancel_token = CancellationToken::new();
    let state = ExtractionState::new(config, platform, cancel_token.clone())?;
    let app = create_extraction_router(state);

    tracing::info!("Extraction service starting on http://{}", addr);
    tracing::info!("  Extract:      POST http://{}{}", addr, path);
    tracing::info!("  Health check: http://{}/health", addr);
    tracing::info!("  API docs:     http://{}/docs", addr);

    server::serve(app, &addr, cancel_token).await?;
    Ok(())
}
