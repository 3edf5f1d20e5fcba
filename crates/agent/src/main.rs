//! `vigil-agent` -- on-device monitoring client.
//!
//! Captures video, shows it with the face region pixelated, sends
//! periodic snapshots to the analysis service and mirrors the service's
//! alert history and monitoring status. Runs until Ctrl-C.
//!
//! # Environment variables
//!
//! See [`AgentConfig::from_env`]; `RUST_LOG` controls log filtering
//! (default `vigil_agent=info,vigil_client=info`).

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vigil_agent::capture::PatternCamera;
use vigil_agent::config::AgentConfig;
use vigil_agent::surface::ConsoleSurface;
use vigil_agent::Monitor;
use vigil_client::MonitorApi;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vigil_agent=info,vigil_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AgentConfig::from_env().unwrap_or_else(|e| {
        tracing::error!(error = %e, "Invalid configuration");
        std::process::exit(1);
    });

    let api = MonitorApi::new(&config.api_url, config.request_timeout).unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to build HTTP client");
        std::process::exit(1);
    });

    tracing::info!(
        api_url = %config.api_url,
        resolution = %config.capture_resolution,
        analysis_interval_ms = config.analysis_interval.as_millis() as u64,
        mask_outbound_frames = config.mask_outbound_frames,
        "Starting vigil-agent",
    );

    let monitor = Monitor::new(
        config,
        Arc::new(PatternCamera::new()),
        Arc::new(api),
        Arc::new(ConsoleSurface::new()),
    );

    monitor.launch();

    if let Err(e) = monitor.start_session().await {
        tracing::error!(error = %e, "Monitoring session did not start, alert feed stays live");
    }

    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown requested"),
        Err(e) => tracing::error!(error = %e, "Failed to listen for Ctrl-C"),
    }

    monitor.shutdown().await;
}
