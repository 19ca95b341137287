//! floor-report server entry point.
//!
//! Starts the Axum HTTP server with the REST endpoints.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use floor_report::api;
use floor_report::app_state::AppState;
use floor_report::config::ReportConfig;
use floor_report::domain::SessionRegistry;
use floor_report::service::ReportService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = ReportConfig::from_env()?;
    tracing::info!(addr = %config.listen_addr, "starting floor-report");
    if config.ingest.trust_column_order {
        tracing::info!("column mapping: positional, header text is ignored for 8-column files");
    } else {
        tracing::info!("column mapping: by header name");
    }
    tracing::info!(
        delimiter = %config.ingest.delimiter,
        currency_prefix = %config.ingest.currency_prefix,
        day_first = config.ingest.day_first,
        "ingestion settings"
    );

    // Build domain and service layers
    let registry = Arc::new(SessionRegistry::new());
    let report_service = ReportService::new(registry, config.ingest.clone());
    let app_state = AppState::new(report_service);

    // Build router
    let middleware = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.request_timeout_secs,
        )))
        .layer(CorsLayer::permissive());

    let app = api::build_router()
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(middleware)
        .with_state(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
