//! CLADC — Continuous Learning & Autonomous Development Core
//!
//! Long-running coordinator process: ingests learning events and RL
//! experience off the bus, runs the improvement pipeline and model
//! registry, monitors system health, generates reports, and exposes
//! all of it over the Control API.
//!
//! # Usage
//!
//! ```bash
//! cargo run --release
//! CLADC_CONFIG=./cladc.toml cargo run --release -- --addr 0.0.0.0:9000
//! ```
//!
//! # Environment Variables
//!
//! - `CLADC_CONFIG`: Path to a TOML configuration file.
//! - `RUST_LOG`: Logging level (default: info).

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use cladc::api::{create_app, ApiState};
use cladc::config::CladcConfig;
use cladc::coordinator::Coordinator;

#[derive(Parser, Debug)]
#[command(name = "cladc")]
#[command(about = "Continuous Learning & Autonomous Development Core")]
#[command(version)]
struct CliArgs {
    /// Override the Control API bind address (default: 0.0.0.0:8090)
    #[arg(short, long)]
    addr: Option<String>,
}

fn default_capability() -> std::sync::Arc<dyn cladc::types::Capability> {
    std::sync::Arc::new(cladc::capability::SyntheticCapability)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = CliArgs::parse();

    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!("  CLADC — Continuous Learning & Autonomous Development Core");
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let config = CladcConfig::load()?;
    cladc::config::init(config.clone());
    let config = std::sync::Arc::new(config);

    let server_addr = args.addr.unwrap_or_else(|| "0.0.0.0:8090".to_string());

    let cancel_token = CancellationToken::new();
    let shutdown_token = cancel_token.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("received shutdown signal, cancelling coordinator and Control API");
        shutdown_token.cancel();
    });

    let coordinator = Coordinator::new(config, default_capability());

    let app = create_app(ApiState::new(coordinator.clone()));
    let listener = tokio::net::TcpListener::bind(&server_addr)
        .await
        .with_context(|| format!("failed to bind Control API to {server_addr}"))?;
    info!("Control API listening on {}", server_addr);

    let http_cancel = cancel_token.clone();
    let server_handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                http_cancel.cancelled().await;
            })
            .await
    });

    let coordinator_result = coordinator.run(cancel_token).await;
    if let Err(e) = &coordinator_result {
        error!(error = %e, "coordinator exited with an error");
    }

    if let Err(e) = server_handle.await {
        error!(error = %e, "Control API task panicked");
    }

    coordinator_result?;
    info!("CLADC shutdown complete");
    Ok(())
}
