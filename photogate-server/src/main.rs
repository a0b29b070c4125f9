//! Photogate - Headless Gateway Daemon
//!
//! Sits between the photo UI and the compute backend:
//! - Forwards capability calls (`/api/*`, `/health`) with retries and timeouts
//! - Serves fallback payloads when the deployment has no backend
//! - Provides an admin API on `/api/gateway/*` and Prometheus text on `/metrics`
//!
//! Access via: http://localhost:3000

use anyhow::{Context, Result};
use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

mod api;
mod cli;
mod commands;
mod router;
mod server_utils;
mod state;
#[cfg(test)]
mod test_helpers;

use cli::{Cli, Commands};
use photogate_core::gateway::prometheus;
use photogate_core::modules::{config, logger};
use state::AppState;

/// Interval between readiness probes while waiting at startup.
const STARTUP_PROBE_INTERVAL: Duration = Duration::from_secs(1);

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    logger::init_tracing(&cli.log_level);

    let mut gateway_config = config::load_config(cli.config.as_deref())?;
    if let Some(url) = cli.backend_url.clone() {
        gateway_config.backend_url = url;
    }
    let signals = config::deployment_signals_from_env()?;

    match cli.command {
        Some(Commands::Serve { port: Some(port) }) => {
            gateway_config.port = port;
            serve(AppState::from_config(gateway_config, signals)?).await?;
        },
        Some(Commands::Serve { port: None }) | None => {
            if let Some(port) = cli.port {
                gateway_config.port = port;
            }
            serve(AppState::from_config(gateway_config, signals)?).await?;
        },
        Some(Commands::Probe { wait, interval }) => {
            let state = AppState::from_config(gateway_config, signals)?;
            if !commands::handle_probe(&state, wait, interval).await? {
                return Ok(ExitCode::FAILURE);
            }
        },
        Some(Commands::Mode { json }) => {
            let state = AppState::from_config(gateway_config, signals)?;
            commands::handle_mode(&state, json).await?;
        },
        Some(Commands::Capabilities { json }) => {
            let state = AppState::from_config(gateway_config, signals)?;
            commands::handle_capabilities(&state, json)?;
        },
    }

    Ok(ExitCode::SUCCESS)
}

async fn serve(state: AppState) -> Result<()> {
    let config = state.config().clone();
    info!("🚀 Photogate starting on port {}...", config.port);

    if let Err(e) = prometheus::init_metrics() {
        warn!("⚠️ Metrics disabled: {}", e);
    }

    info!("📋 {} capabilities registered", state.registry().len());

    if config.probe.startup_wait_secs > 0 {
        let max_wait = Duration::from_secs(config.probe.startup_wait_secs);
        info!("⏳ Waiting up to {}s for backend at {}", max_wait.as_secs(), config.backend_url);
        if state.probe().wait_until_ready(max_wait, STARTUP_PROBE_INTERVAL).await {
            info!("✅ Backend ready");
        } else {
            warn!("⚠️ Backend not ready after {}s, serving anyway", max_wait.as_secs());
        }
    }

    let refresher = match config.probe.refresh_interval() {
        Some(interval) => Some(state.readiness().start_refresher(state.probe().clone(), interval)),
        None => {
            state.refresh_readiness().await;
            None
        },
    };

    let decision = state.current_mode();
    info!("🧭 Mode: {} ({})", decision.mode, decision.message());

    let app = router::build_router(state.clone());
    let listener = server_utils::open_listener(&config)?;
    let addr = listener.local_addr().context("Listener has no local address")?;

    info!("🌐 Server listening on http://{}", addr);
    info!("🔌 Admin API at http://{}/api/gateway/", addr);
    info!("🔀 Forwarding to {}", config.backend_url);

    axum::serve(listener, app)
        .with_graceful_shutdown(server_utils::shutdown_signal(Arc::clone(state.readiness())))
        .await?;

    if let Some(handle) = refresher {
        let _ = handle.await;
    }

    info!("👋 Photogate stopped");
    Ok(())
}
