//! Upload handlers: add and remove CSV files in a session.

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{delete, post};
use axum::{Json, Router};

use crate::api::dto::{UploadParams, UploadResponse, UploadedFileDto};
use crate::app_state::AppState;
use crate::domain::{FileId, SessionId};
use crate::error::{ErrorResponse, ReportError};

/// `POST /sessions/:id/files`: Upload one CSV export.
///
/// The request body is the raw file. Schema problems do not fail the
/// upload; they are reported per file when the report is generated.
///
/// # Errors
///
/// Returns [`ReportError::InvalidGameLabel`] for a blank `game`,
/// [`ReportError::InvalidRequest`] for a bad `delimiter` or empty body, and
/// [`ReportError::SessionNotFound`] for an unknown session.
#[utoipa::path(
    post,
    path = "/api/v1/sessions/{id}/files",
    tag = "Files",
    summary = "Upload a CSV file",
    description = "Stores the raw CSV bytes in the session under the given game label. The file is parsed when a report is requested.",
    params(
        ("id" = uuid::Uuid, Path, description = "Session UUID"),
        UploadParams,
    ),
    request_body(content = String, content_type = "text/csv", description = "Raw CSV export"),
    responses(
        (status = 201, description = "File stored", body = UploadResponse),
        (status = 400, description = "Invalid game label, delimiter or body", body = ErrorResponse),
        (status = 404, description = "Session not found", body = ErrorResponse),
    )
)]
pub async fn upload_file(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
    Query(params): Query<UploadParams>,
    body: Bytes,
) -> Result<impl IntoResponse, ReportError> {
    let session_id = SessionId::from_uuid(id);
    let file_id = state
        .report_service
        .upload(
            session_id,
            params.file_name.as_deref(),
            &params.game,
            params.delimiter.as_deref(),
            &body,
        )
        .await?;

    let session = state.report_service.session(session_id).await?;
    let file = session
        .files
        .iter()
        .find(|f| f.file_id == file_id)
        .map(UploadedFileDto::from)
        .ok_or(ReportError::FileNotFound(*file_id.as_uuid()))?;

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            session_id: id,
            file_id: *file_id.as_uuid(),
            file,
        }),
    ))
}

/// `DELETE /sessions/:id/files/:file_id`: Remove an uploaded file.
///
/// # Errors
///
/// Returns [`ReportError::SessionNotFound`] or [`ReportError::FileNotFound`].
#[utoipa::path(
    delete,
    path = "/api/v1/sessions/{id}/files/{file_id}",
    tag = "Files",
    summary = "Remove an uploaded file",
    params(
        ("id" = uuid::Uuid, Path, description = "Session UUID"),
        ("file_id" = uuid::Uuid, Path, description = "File UUID"),
    ),
    responses(
        (status = 204, description = "File removed"),
        (status = 404, description = "Session or file not found", body = ErrorResponse),
    )
)]
pub async fn delete_file(
    State(state): State<AppState>,
    Path((id, file_id)): Path<(uuid::Uuid, uuid::Uuid)>,
) -> Result<impl IntoResponse, ReportError> {
    state
        .report_service
        .remove_file(SessionId::from_uuid(id), FileId::from_uuid(file_id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// File upload routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/sessions/{id}/files", post(upload_file))
        .route("/sessions/{id}/files/{file_id}", delete(delete_file))
}
