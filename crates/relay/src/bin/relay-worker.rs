//! relay-worker: forwards OrcaHello detections to Orcasite on a fixed interval.
//!
//! Configuration comes from the environment (and `.env`); see
//! `orca_core::config`. A liveness endpoint runs beside the poll loop unless
//! disabled.

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info, warn};

use orca_core::config::load_dotenv;
use orca_core::RelayConfig;
use orca_relay::health::{self, HealthState};
use orca_relay::{HttpTransport, PollDriver, Reconciler, Shutdown};

// ── CLI ─────────────────────────────────────────────────────────────

/// OrcaHello → Orcasite detection relay.
#[derive(Parser, Debug)]
#[command(name = "relay-worker", version, about)]
struct Cli {
    /// Run a single reconciliation cycle and exit.
    #[arg(long)]
    once: bool,

    /// Do not start the liveness endpoint.
    #[arg(long, env = "RELAY_NO_HEALTH")]
    no_health: bool,
}

// ── main ────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config = RelayConfig::from_env();
    config.log_summary();
    if !config.destination.has_api_key() {
        warn!("APIKEY is not set; destination writes will be rejected");
    }

    let transport = HttpTransport::new(config.poll.http_timeout())
        .context("failed to build HTTP client")?;
    let reconciler = Reconciler::new(Arc::new(transport), &config)
        .context("invalid endpoint configuration")?;
    info!(
        source = %reconciler.endpoints().source_detections,
        destination = %reconciler.endpoints().destination_detections,
        "Endpoints resolved"
    );
    let driver = PollDriver::new(reconciler, config.poll.interval());

    if cli.once {
        let report = driver.tick().await?;
        info!(submitted = report.submitted, "Single cycle complete");
        return Ok(());
    }

    let shutdown = Arc::new(Shutdown::new());
    let signal_handle = {
        let shutdown = shutdown.clone();
        tokio::spawn(async move { shutdown.trigger_on_signal().await })
    };

    let health_handle = if cli.no_health {
        None
    } else {
        let addr = config.server.bind_addr();
        let state = HealthState {
            driver: driver.status(),
            config: Arc::new(config.redacted_summary()),
        };
        let shutdown = shutdown.clone();
        Some(tokio::spawn(async move {
            if let Err(e) = health::serve(&addr, state, shutdown).await {
                error!(%addr, error = %e, "Liveness endpoint failed");
            }
        }))
    };

    info!("relay-worker starting");
    driver.run(&shutdown).await;

    signal_handle.abort();
    if let Some(handle) = health_handle {
        let _ = handle.await;
    }
    info!("relay-worker exited cleanly");

    Ok(())
}
