//! # UAV Radar Server
//!
//! Binary entry point: runs the simulation and serves it over HTTP/WebSocket.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use uav_radar_api::{AppState, Config, build_router};
use uav_simulator::Simulator;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    tracing::info!(
        version = uav_radar_api::VERSION,
        "Starting UAV Radar Simulator"
    );

    let zone = config.simulation.zone;
    tracing::info!(
        latitude = zone.latitude,
        longitude = zone.longitude,
        altitude = zone.altitude,
        radius_m = zone.radius,
        max_uavs = config.simulation.max_population,
        "Radar zone configured"
    );

    // Build simulation and seed before accepting observers
    let mut simulator = Simulator::new(config.simulation.clone())?;
    let seeded = simulator.seed_population()?;
    tracing::info!(count = seeded.len(), "Initial UAVs spawned");

    let state = AppState::from_simulator(&simulator);
    let engine = simulator.spawn();

    // Build router
    let app = build_router(state, &config.cors_origins);

    // Start server
    let addr = config.server_addr;
    tracing::info!(%addr, "Starting HTTP server");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("Track stream at ws://{}/socket.io", addr);
    tracing::info!("Health check at http://{}/api/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    engine.abort();
    tracing::info!("Server shut down gracefully");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, shutting down");
        }
    }
}
