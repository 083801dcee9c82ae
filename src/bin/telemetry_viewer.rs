//! Headless dashboard: subscribes to the relay and logs each reading.

use tokio::sync::watch;
use tracing::{info, warn};

use telemetry_relay::adapters::TelemetryViewer;
use telemetry_relay::config::AppConfig;
use telemetry_relay::observability::init_tracing;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;

    init_tracing(&config.server);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = shutdown_tx.send(true);
        }
    });

    let viewer = TelemetryViewer::new(&config.viewer);
    let result = viewer.run(shutdown_rx).await;

    let state = viewer.state();
    let state = state.read().await;
    info!(
        status = state.status_label(),
        temperature = state.current_temperature(),
        humidity = state.current_humidity(),
        points = state.history().len(),
        "Viewer stopped"
    );

    if let Err(e) = &result {
        warn!(error = %e, "Viewer session ended with an error");
    }
    result.map_err(Into::into)
}
