//! Healthcheck sidecar CLI
//!
//! Command-line interface for the inference endpoint monitoring service.

use std::path::PathBuf;

use clap::Parser;
use healthcheck_sidecar::{load_config, Config, SidecarBuilder};
use tracing::Level;

#[derive(Parser)]
#[command(name = "healthcheck-sidecar")]
#[command(about = "Inference endpoint health monitoring sidecar")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Status server port (overrides config file)
    #[arg(short, long)]
    port: Option<u16>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: Level,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .init();

    tracing::debug!(
        "Parsed command line arguments: config={:?}, port={:?}, log_level={:?}",
        args.config,
        args.port,
        args.log_level
    );

    let mut config = if let Some(config_path) = &args.config {
        tracing::debug!("Loading configuration from {:?}", config_path);
        load_config(config_path)?
    } else {
        tracing::debug!("Using default configuration");
        Config::default()
    };

    config.apply_env();

    if let Some(port) = args.port {
        config.server.port = port;
    }

    config.validate()?;

    tracing::info!("Starting healthcheck sidecar");
    tracing::debug!(
        "Targets: {}, Notifiers: {}, Port: {}",
        config.targets.len(),
        config.notifiers.len(),
        config.server.port
    );

    SidecarBuilder::new(config).build().await?.start().await?;

    Ok(())
}
