use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Instant;
use tokio::signal;
use tracing::{info, warn};

mod api;
mod config;
mod engine;
mod models;
mod probe;
mod report;
mod store;
mod usage;
mod utils;

use crate::api::AppState;
use crate::config::MonitorConfig;
use crate::engine::Monitor;
use crate::probe::Prober;

#[tokio::main]
async fn main() -> Result<()> {
    let started_at = Instant::now();
    utils::setup_console();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive(tracing::Level::INFO.into()))
        .with_ansi(true)
        .init();

    let config = MonitorConfig::from_env().context("Failed to load configuration")?;
    for target in config.targets.all() {
        info!(target_id = %target.id, url = %target.url, "Monitoring {}", target.name);
    }

    if config.can_stall_on_hung_target() {
        warn!("OVERLAP_POLICY=skip without PROBE_TIMEOUT_SECS: a hung target will stop all later cycles");
    }

    let prober = Prober::new(config.probe_timeout).context("Failed to create HTTP client")?;
    let monitor = Arc::new(Monitor::new(config.targets.clone(), prober));

    let state = AppState {
        store: monitor.store.clone(),
        started_at,
    };
    let api_port = config.api_port;
    tokio::spawn(async move {
        if let Err(e) = api::start_server(api_port, state).await {
            tracing::error!("Status server failed: {:#}", e);
        }
    });

    let monitor_clone = Arc::clone(&monitor);
    tokio::spawn(monitor_clone.run(config.ping_interval, config.overlap_policy));

    signal::ctrl_c().await?;
    info!("Shutdown signal received. Stopping keep-alive monitor...");

    Ok(())
}
