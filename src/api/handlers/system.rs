//! System endpoints: health check, effective ingestion settings.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::app_state::AppState;

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    status: String,
    timestamp: String,
    version: String,
}

/// `GET /health`: Service health status.
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    summary = "Health check",
    description = "Returns service health status, version, and current timestamp.",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
    )
)]
pub async fn health_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}

/// Ingestion settings applied to every upload.
#[derive(Debug, Serialize, ToSchema)]
pub struct IngestConfigResponse {
    trust_column_order: bool,
    delimiter: String,
    currency_prefix: String,
    day_first: bool,
    latin1_fallback: bool,
    sample_lines: usize,
}

/// `GET /config/ingest`: Effective ingestion options.
#[utoipa::path(
    get,
    path = "/config/ingest",
    tag = "System",
    summary = "Ingestion settings",
    description = "Returns the column mapping mode, default delimiter strategy, currency prefix and date order used when parsing uploads.",
    responses(
        (status = 200, description = "Effective ingestion options", body = IngestConfigResponse),
    )
)]
pub async fn ingest_config_handler(State(state): State<AppState>) -> impl IntoResponse {
    let options = state.report_service.ingest_options();
    Json(IngestConfigResponse {
        trust_column_order: options.trust_column_order,
        delimiter: options.delimiter.to_string(),
        currency_prefix: options.currency_prefix.clone(),
        day_first: options.day_first,
        latin1_fallback: options.latin1_fallback,
        sample_lines: options.sample_lines,
    })
}

/// System routes mounted at the root level (not under /api/v1).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_handler))
        .route("/config/ingest", get(ingest_config_handler))
}
