use anyhow::Result;
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, Color, Table};
use std::time::Duration;

use photogate_core::gateway::capability::{CapabilityInfo, CapabilityKind, FailurePolicy};
use photogate_core::gateway::server::system_mode_body;
use photogate_types::models::{Mode, ModeDecision};

use crate::state::AppState;

/// Probe the backend once, or keep probing for up to `wait_secs`.
/// Returns whether it answered healthy.
pub async fn handle_probe(state: &AppState, wait_secs: u64, interval_ms: u64) -> Result<bool> {
    let probe = state.probe();
    println!("{} {}", "Probing".cyan(), probe.health_url());

    let ready = if wait_secs == 0 {
        state.refresh_readiness().await.is_reachable()
    } else {
        let ready = probe
            .wait_until_ready(Duration::from_secs(wait_secs), Duration::from_millis(interval_ms))
            .await;
        state.refresh_readiness().await;
        ready
    };

    let snapshot = state.readiness().snapshot();
    if ready {
        let latency = snapshot.latency_ms.map(|ms| format!(" ({ms}ms)")).unwrap_or_default();
        println!("{} Backend is ready{}", "✓".green(), latency);
    } else {
        println!("{} Backend is not reachable", "✗".red());
    }
    Ok(ready)
}

/// Resolve the mode after one readiness check, as a request arriving now would.
pub async fn handle_mode(state: &AppState, json: bool) -> Result<()> {
    state.refresh_readiness().await;
    let decision = state.current_mode();

    if json {
        println!("{}", serde_json::to_string_pretty(&system_mode_body(&decision))?);
        return Ok(());
    }

    println!("{}", "Photogate Mode".cyan().bold());
    println!("  Mode:      {}", colored_mode(&decision));
    println!("  Read-only: {}", decision.read_only);
    println!(
        "  Backend:   {}",
        decision.backend.as_ref().map_or_else(|| "-".to_string(), ToString::to_string)
    );
    println!("  {}", decision.message().dimmed());
    Ok(())
}

fn colored_mode(decision: &ModeDecision) -> colored::ColoredString {
    let label = decision.mode.to_string();
    match decision.mode {
        Mode::Live => label.green(),
        Mode::Demo => label.yellow(),
        Mode::RemoteHosted => label.blue(),
    }
}

pub fn handle_capabilities(state: &AppState, json: bool) -> Result<()> {
    let capabilities = state.registry().describe();

    if json {
        println!("{}", serde_json::to_string_pretty(&capabilities)?);
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Name", "Method", "Path", "Kind", "Policy", "Fallback"]);

    for info in &capabilities {
        table.add_row(capability_row(info));
    }

    println!("{table}");
    println!("\n{} capabilities total", capabilities.len());
    Ok(())
}

fn capability_row(info: &CapabilityInfo) -> Vec<Cell> {
    let kind = match info.kind {
        CapabilityKind::Read => Cell::new("read").fg(Color::Green),
        CapabilityKind::Mutation => Cell::new("mutation").fg(Color::Yellow),
        CapabilityKind::Telemetry => Cell::new("telemetry").fg(Color::DarkGrey),
    };
    let policy = match info.policy {
        FailurePolicy::HardFail => "hard_fail",
        FailurePolicy::SoftFallback => "soft_fallback",
        FailurePolicy::AlwaysSucceed => "always_succeed",
    };

    vec![
        Cell::new(&info.name),
        Cell::new(&info.method),
        Cell::new(&info.path),
        kind,
        Cell::new(policy),
        Cell::new(if info.has_fallback { "yes" } else { "-" }),
    ]
}
