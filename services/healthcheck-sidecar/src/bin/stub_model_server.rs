//! Stub model server
//!
//! Serves `/health` and `/v1/models` for a single model so the sidecar can be
//! run locally without a real inference backend.

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use healthcheck_sidecar::stub::{build_router, StubBehavior};
use tokio::sync::RwLock;
use tracing::Level;

#[derive(Parser)]
#[command(name = "stub-model-server")]
#[command(about = "Stub inference server answering /health and /v1/models")]
#[command(version)]
struct Args {
    /// Model ID to report from /v1/models
    #[arg(short, long)]
    model_name: String,

    /// Port to listen on
    #[arg(short, long, default_value_t = 8001)]
    port: u16,

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

    let behavior = Arc::new(RwLock::new(StubBehavior::serving(args.model_name)));
    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!(
        "Serving on http://{}/health and http://{}/v1/models",
        addr,
        addr
    );

    axum::serve(listener, build_router(behavior))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    Ok(())
}
