// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use anyhow::Context;
use axum::{
    routing::{get, post},
    Router,
};
use std::{net::SocketAddr, sync::Arc};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::application::fleet_service::FleetService;
use crate::application::visualization_service::VisualizationService;
use crate::infrastructure::config::{load_app_config, load_station_registry};
use crate::infrastructure::influx_repository::InfluxRepository;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    fleet_safety, health_check, render_query, render_visualization, stream_fleet_safety,
    suggest_visualizations,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing, RUST_LOG overrides the default
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("fleet_insights=info,tower_http=info")),
        )
        .init();

    // Load configuration
    let app_config = load_app_config().context("Failed to load config/fleet")?;
    let registry = load_station_registry().context("Failed to load config/stations")?;
    tracing::info!("Loaded {} stations from registry", registry.stations.len());

    // Create repository (infrastructure layer)
    let repository = Arc::new(InfluxRepository::new(
        app_config.influx.host,
        app_config.influx.token,
        app_config.influx.database,
        app_config.influx.retention_policy,
        app_config.fleet,
    ));

    // Create services (application layer)
    let visualization_service = VisualizationService::new(repository.clone(), app_config.pipeline);
    let fleet_service = FleetService::new(repository, registry.stations);

    let state = Arc::new(AppState {
        visualization_service,
        fleet_service,
    });

    // Build router (presentation layer)
    // Compression is negotiated per handler, so no CompressionLayer here
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/visualizations/suggest", post(suggest_visualizations))
        .route("/visualizations/render", post(render_visualization))
        .route("/queries/render", post(render_query))
        .route("/fleet/safety", get(fleet_safety))
        .route("/fleet/safety/stream", get(stream_fleet_safety))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr: SocketAddr = app_config
        .server
        .bind_address
        .parse()
        .with_context(|| format!("Invalid bind address {}", app_config.server.bind_address))?;
    tracing::info!("Starting fleet-insights service on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
