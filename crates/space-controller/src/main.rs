//! Space Controller
//!
//! Authoritative spatial-audio override resolver for one shared session.
//!
//! # Startup Flow
//!
//! 1. Load configuration from environment
//! 2. Initialize Prometheus metrics recorder
//! 3. Spawn the space actor (owns the override engine)
//! 4. Preload zone definitions from the configured file, if any
//! 5. Start the HTTP server (API, health probes, metrics)
//! 6. Wait for shutdown signal, then cancel and drain

#![warn(clippy::pedantic)]
#![allow(clippy::too_many_lines)] // main.rs orchestrates startup, naturally longer

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::Router;
use metrics_exporter_prometheus::PrometheusBuilder;
use space_controller::actors::{SpaceActor, ZoneSpec};
use space_controller::config::Config;
use space_controller::observability::{health_router, HealthState};
use space_controller::routes::{build_routes, AppState};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "space_controller=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Space Controller");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    info!(
        session_id = %config.session_id,
        bind_address = %config.bind_address,
        zones_file = ?config.zones_file,
        "Configuration loaded successfully"
    );

    // Initialize Prometheus metrics recorder before any metrics are
    // recorded
    let prometheus_handle = PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install Prometheus metrics recorder")?;
    info!("Prometheus metrics recorder initialized");

    // Initialize health state
    let health_state = Arc::new(HealthState::new());

    // Spawn the actor system
    let cancel_token = CancellationToken::new();
    let (actor_handle, actor_task) =
        SpaceActor::spawn(config.session_id.clone(), cancel_token.clone());
    info!("Space actor started");

    // Preload zones
    if let Some(path) = &config.zones_file {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read zones file {path}"))?;
        let specs: Vec<ZoneSpec> = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse zones file {path}"))?;
        for spec in specs {
            let name = spec.name.clone();
            let created = actor_handle
                .create_zone(spec)
                .await
                .with_context(|| format!("Failed to preload zone {name:?}"))?;
            info!(zone_id = %created.zone_id, zone_name = %name, "Zone preloaded");
        }
    }

    // Build the application router: API + health probes + metrics
    let app_state = Arc::new(AppState {
        actor: actor_handle.clone(),
    });
    let metrics_router = Router::new().route(
        "/metrics",
        axum::routing::get(move || {
            let handle = prometheus_handle.clone();
            async move { handle.render() }
        }),
    );
    let app = build_routes(app_state)
        .merge(health_router(Arc::clone(&health_state)))
        .merge(metrics_router);

    // Bind before spawning to fail fast on bind errors
    let addr: SocketAddr = config
        .bind_address
        .parse()
        .with_context(|| format!("Invalid bind address {:?}", config.bind_address))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(addr = %addr, "HTTP server bound successfully");

    let server_shutdown_token = cancel_token.child_token();
    let server = tokio::spawn(async move {
        let server = axum::serve(listener, app).with_graceful_shutdown(async move {
            server_shutdown_token.cancelled().await;
            info!("HTTP server shutting down");
        });
        if let Err(e) = server.await {
            error!(error = %e, "HTTP server failed");
        }
    });

    health_state.set_ready();
    info!("Space Controller running - press Ctrl+C to shutdown");

    // Wait for shutdown signal
    shutdown_signal().await;
    info!("Shutdown signal received, initiating graceful shutdown...");

    // Stop accepting traffic, then cancel everything
    health_state.set_not_ready();
    cancel_token.cancel();

    // Give in-flight requests time to drain
    tokio::time::sleep(Duration::from_secs(config.shutdown_grace_seconds)).await;

    if let Err(e) = server.await {
        error!(error = %e, "HTTP server task failed");
    }
    if let Err(e) = actor_task.await {
        error!(error = %e, "Space actor task failed");
    }

    info!("Space Controller shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
///
/// # Panics
///
/// Panics if signal handlers cannot be installed. This is acceptable
/// because without signal handlers the service cannot shut down
/// gracefully.
async fn shutdown_signal() {
    let ctrl_c = async {
        #[expect(
            clippy::expect_used,
            reason = "Signal handler installation is critical - panic is appropriate if it fails"
        )]
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        #[expect(
            clippy::expect_used,
            reason = "Signal handler installation is critical - panic is appropriate if it fails"
        )]
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
