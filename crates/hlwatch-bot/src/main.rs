//! hlwatch-bot - Hyperliquid fill relay to Telegram.

use anyhow::Result;
use clap::Parser;
use tracing::info;

/// Relay Hyperliquid fills of watched accounts to a Telegram chat
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via HLWATCH_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize TLS crypto provider (must be before any network connections)
    hlwatch_ws::init_crypto();

    let args = Args::parse();

    hlwatch_telemetry::init_logging()?;

    info!("Starting hlwatch-bot v{}", env!("CARGO_PKG_VERSION"));

    // Config path: CLI arg > HLWATCH_CONFIG env var > default
    let config_path = args.config.or_else(|| std::env::var("HLWATCH_CONFIG").ok());

    let config = hlwatch_bot::AppConfig::load(config_path.as_deref())?;
    info!(
        ws_url = %config.ws_url,
        chat_id = %config.credentials.chat_id(),
        max_reconnect_attempts = config.websocket.max_reconnect_attempts,
        "Configuration loaded"
    );

    let app = hlwatch_bot::Application::new(config)?;

    // A feed client that gives up surfaces here and exits non-zero
    app.run().await?;

    Ok(())
}
