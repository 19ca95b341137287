//! Session handlers: create, list, get, delete.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{SessionListResponse, SessionResponse, SessionSummaryDto};
use crate::app_state::AppState;
use crate::domain::SessionId;
use crate::error::{ErrorResponse, ReportError};

/// `POST /sessions`: Open an upload session.
///
/// # Errors
///
/// Returns [`ReportError`] if the session cannot be registered.
#[utoipa::path(
    post,
    path = "/api/v1/sessions",
    tag = "Sessions",
    summary = "Open an upload session",
    description = "Creates an empty in-memory session that collects CSV uploads for one report.",
    responses(
        (status = 201, description = "Session created", body = SessionResponse),
    )
)]
pub async fn create_session(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ReportError> {
    let session = state.report_service.open_session().await?;
    Ok((StatusCode::CREATED, Json(SessionResponse::from(&session))))
}

/// `GET /sessions`: List open sessions.
#[utoipa::path(
    get,
    path = "/api/v1/sessions",
    tag = "Sessions",
    summary = "List sessions",
    description = "Returns every open session ordered by creation time.",
    responses(
        (status = 200, description = "Session list", body = SessionListResponse),
    )
)]
pub async fn list_sessions(State(state): State<AppState>) -> impl IntoResponse {
    let data: Vec<SessionSummaryDto> = state
        .report_service
        .list_sessions()
        .await
        .into_iter()
        .map(SessionSummaryDto::from)
        .collect();
    let total = data.len();
    Json(SessionListResponse { data, total })
}

/// `GET /sessions/:id`: Session details with its file list.
///
/// # Errors
///
/// Returns [`ReportError::SessionNotFound`] if the session does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/sessions/{id}",
    tag = "Sessions",
    summary = "Get session details",
    params(
        ("id" = uuid::Uuid, Path, description = "Session UUID"),
    ),
    responses(
        (status = 200, description = "Session details", body = SessionResponse),
        (status = 404, description = "Session not found", body = ErrorResponse),
    )
)]
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, ReportError> {
    let session = state
        .report_service
        .session(SessionId::from_uuid(id))
        .await?;
    Ok(Json(SessionResponse::from(&session)))
}

/// `DELETE /sessions/:id`: Drop a session and its uploads.
///
/// # Errors
///
/// Returns [`ReportError::SessionNotFound`] if the session does not exist.
#[utoipa::path(
    delete,
    path = "/api/v1/sessions/{id}",
    tag = "Sessions",
    summary = "Delete a session",
    params(
        ("id" = uuid::Uuid, Path, description = "Session UUID"),
    ),
    responses(
        (status = 204, description = "Session deleted"),
        (status = 404, description = "Session not found", body = ErrorResponse),
    )
)]
pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, ReportError> {
    state
        .report_service
        .close_session(SessionId::from_uuid(id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Session management routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/sessions", post(create_session).get(list_sessions))
        .route("/sessions/{id}", get(get_session).delete(delete_session))
}
