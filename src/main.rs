mod cli;
mod config;
mod inventory;
mod models;
mod orchestrator;
mod panos;
mod pipeline;
mod report;
mod steps;
mod utils;

#[cfg(test)]
mod testing;

use clap::Parser;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::{Cli, Goal};
use config::Config;
use orchestrator::Orchestrator;
use panos::PanosClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fw_provision=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    // Load configuration; flags override the environment
    let mut cfg = Config::load();
    cli.apply(&mut cfg);
    let credential = Arc::new(cfg.credential()?);

    tracing::info!("Starting fw-provision");
    tracing::info!("Devices: {}", cli.devices);
    tracing::info!("Concurrency: {}", cfg.concurrency);
    tracing::info!("Report: {}", cfg.output_path);

    let devices = inventory::load(&cli.devices).await?;
    if devices.is_empty() {
        tracing::warn!("No devices to process");
    }

    let client = PanosClient::new(Duration::from_secs(cfg.api_timeout_secs), cfg.tls_insecure)?;
    let orchestrator = Orchestrator::new(Arc::new(client), cfg.concurrency);

    let report = match cli.goal() {
        Goal::ProvisionLoopback { params, commit } => {
            let pipeline = steps::provision_loopback(&params, commit);
            orchestrator
                .run_all(devices, credential, Arc::new(pipeline), Arc::new(params))
                .await
        }
        Goal::Audit(params) => {
            orchestrator
                .run_all(devices, credential, Arc::new(steps::audit()), Arc::new(params))
                .await
        }
    };

    report.log_summary();
    report
        .write_delimited(Path::new(&cfg.output_path), cfg.output_delimiter)
        .await?;

    Ok(())
}
