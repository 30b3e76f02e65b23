// Main entry point - Dependency injection and server setup
mod domain;
mod application;
mod infrastructure;
mod presentation;

use std::sync::Arc;
use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::{compression::CompressionLayer, trace::TraceLayer};
use tracing_subscriber::EnvFilter;

use crate::application::dashboard_session::{DashboardService, SystemClock};
use crate::infrastructure::config::load_app_config;
use crate::infrastructure::metering_client::HttpMeteringRepository;
use crate::presentation::app_state::{AppState, SessionRegistry};
use crate::presentation::handlers::{
    create_session, delete_session, get_session, health_check, list_ranges, pinch, select_range,
    set_scale, stream_session,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = load_app_config()?;
    let addr = config.bind_addr()?;

    // Create repository (infrastructure layer)
    let repository = Arc::new(HttpMeteringRepository::new(
        config.metering.host.clone(),
        config.metering.api_key.clone(),
    ));

    // Create services (application layer)
    let dashboard_service = DashboardService::new(
        repository,
        Arc::new(SystemClock),
        config.poll_period(),
        config.request_timeout(),
    );

    let state = Arc::new(AppState {
        dashboard_service,
        sessions: SessionRegistry::default(),
    });

    // Build router (presentation layer)
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/ranges", get(list_ranges))
        .route("/sessions", post(create_session))
        .route("/sessions/:id", get(get_session).delete(delete_session))
        .route("/sessions/:id/stream", get(stream_session))
        .route("/sessions/:id/range", put(select_range))
        .route("/sessions/:id/scale", put(set_scale))
        .route("/sessions/:id/zoom/:channel_id", post(pinch))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    tracing::info!(
        %addr,
        metering_host = %config.metering.host,
        poll_period_ms = config.polling.period_ms,
        "starting metering dashboard service"
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
