//! REST API layer: route handlers, DTOs, and router composition.
//!
//! Resource endpoints are mounted under `/api/v1`; health and config at the
//! root. With the `swagger-ui` feature the OpenAPI document is served at
//! `/api-docs/openapi.json` and browsable at `/swagger-ui`.

pub mod dto;
pub mod handlers;

use axum::Router;
use utoipa::OpenApi;

use crate::app_state::AppState;
use crate::error::{ErrorBody, ErrorResponse};

/// OpenAPI document for every REST endpoint.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "floor-report",
        description = "CSV ingestion and hourly RTP/loss aggregation for casino terminal exports."
    ),
    paths(
        handlers::system::health_handler,
        handlers::system::ingest_config_handler,
        handlers::sessions::create_session,
        handlers::sessions::list_sessions,
        handlers::sessions::get_session,
        handlers::sessions::delete_session,
        handlers::files::upload_file,
        handlers::files::delete_file,
        handlers::reports::get_report,
        handlers::reports::get_losses,
        handlers::reports::get_players,
    ),
    components(schemas(ErrorResponse, ErrorBody)),
    tags(
        (name = "System", description = "Health and configuration"),
        (name = "Sessions", description = "Upload sessions"),
        (name = "Files", description = "CSV uploads"),
        (name = "Reports", description = "Aggregated views"),
    )
)]
pub struct ApiDoc;

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    let router = Router::new()
        .nest("/api/v1", handlers::routes())
        .merge(handlers::system::routes());

    #[cfg(feature = "swagger-ui")]
    let router = router.merge(
        utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
            .url("/api-docs/openapi.json", ApiDoc::openapi()),
    );

    router
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_every_route() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&str> = doc.paths.paths.keys().map(String::as_str).collect();
        for expected in [
            "/health",
            "/config/ingest",
            "/api/v1/sessions",
            "/api/v1/sessions/{id}",
            "/api/v1/sessions/{id}/files",
            "/api/v1/sessions/{id}/files/{file_id}",
            "/api/v1/sessions/{id}/report",
            "/api/v1/sessions/{id}/report/losses",
            "/api/v1/sessions/{id}/report/players",
        ] {
            assert!(paths.contains(&expected), "missing {expected}");
        }
    }
}
