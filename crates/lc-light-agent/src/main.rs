//! lightctl controller: edge-toggle pipeline plus MQTT light control.
//!
//! Host builds run against the in-memory GPIO driver; board builds swap in
//! the real driver behind the same `GpioDriver` trait.

use std::sync::Arc;

use lc_gpio::MockGpio;
use tracing_subscriber::EnvFilter;

use lc_light_agent::boot;
use lc_light_agent::config::AgentConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "lc-light-agent starting"
    );

    // ── Load config ─────────────────────────────────────────────
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "/etc/lightctl/agent.toml".to_string());

    let config = AgentConfig::from_file(&config_path)?;
    tracing::info!(
        product_key = %config.device.product_key,
        device_name = %config.device.device_name,
        region = %config.region,
        "config loaded"
    );

    // ── Boot ────────────────────────────────────────────────────
    let gpio = Arc::new(MockGpio::new());
    let mut device = boot::boot(&config, gpio)?;

    tracing::info!("lc-light-agent ready");

    tokio::select! {
        () = device.control_channel_stopped() => {
            tracing::error!("MQTT loop exited unexpectedly");
        }
        // Graceful shutdown on SIGINT
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutdown signal received");
        }
    }

    let report = device.shutdown().await;
    tracing::info!(
        edges_processed = report.processed,
        edges_dropped = report.dropped,
        "lc-light-agent stopped"
    );
    Ok(())
}
