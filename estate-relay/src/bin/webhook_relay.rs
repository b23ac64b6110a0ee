use clap::Parser;
use tokio_util::sync::CancellationToken;

use estate_relay::api::{create_relay_router, RelayState};
use estate_relay::config::RelayConfig;
use estate_relay::server;

#[derive(Parser)]
#[command(name = "webhook-relay")]
#[command(about = "Forwards POST requests to an n8n webhook")]
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

    let mut config = RelayConfig::from_env();
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    let addr = config.server.addr();
    tracing::info!("Webhook relay starting on http://{}", addr);
    tracing::info!("  Relay path: {} -> {}", config.webhook.path, config.webhook.url);

    let state = RelayState::new(config)?;
    let app = create_relay_router(state);

    server::serve(app, &addr, CancellationToken::new()).await?;
    Ok(())
}
