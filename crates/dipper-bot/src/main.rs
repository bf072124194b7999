//! dipper trading bot entry point.

use anyhow::Result;
use clap::Parser;
use tracing::info;

/// Automated dip-buying spot trading bot
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via DIPPER_CONFIG)
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    dipper_telemetry::init_logging()?;

    info!("Starting dipper-bot v{}", env!("CARGO_PKG_VERSION"));

    let config_path = args
        .config
        .or_else(|| std::env::var("DIPPER_CONFIG").ok())
        .unwrap_or_else(|| "config/default.toml".to_string());

    info!(config_path = %config_path, "Loading configuration");
    let config = dipper_bot::AppConfig::load(&config_path)?;
    info!(?config.mode, symbols = config.symbols.len(), "Configuration loaded");

    let app = dipper_bot::Application::new(config)?;

    tokio::select! {
        result = app.run() => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown requested");
        }
    }

    Ok(())
}
