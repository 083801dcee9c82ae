use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{info, warn};

use telemetry_relay::adapters::http::app_router;
use telemetry_relay::adapters::{InMemoryConnectionRegistry, TelemetryHub, WebSocketState};
use telemetry_relay::config::AppConfig;
use telemetry_relay::observability::init_tracing;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;

    init_tracing(&config.server);

    let registry = Arc::new(InMemoryConnectionRegistry::new());
    let hub = Arc::new(TelemetryHub::new(registry, &config.hub));
    let app = app_router(WebSocketState::new(hub.clone()), &config);

    let addr = config.server.socket_addr();
    info!(
        %addr,
        ws_path = %config.hub.ws_path,
        include_sender = config.hub.include_sender,
        "Starting telemetry relay"
    );

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(hub.clone()))
        .await?;

    // Upgraded sockets outlive the HTTP server; give them time to clean up.
    if !hub.wait_for_drain(config.hub.shutdown_grace()).await {
        warn!(
            connections = hub.live_connections(),
            "Shutdown grace period elapsed with connections still open"
        );
    }

    info!("Telemetry relay stopped");
    Ok(())
}

async fn shutdown_signal(hub: Arc<TelemetryHub>) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
    hub.shutdown().await;
}
