//! Session DTOs for create, get, list and upload operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{SessionSummary, UploadSession, UploadedFile};

/// One uploaded file as shown in session details.
#[derive(Debug, Serialize, ToSchema)]
pub struct UploadedFileDto {
    /// File identifier.
    pub file_id: uuid::Uuid,
    /// File name.
    pub file_name: String,
    /// Game label applied to every row of the file.
    pub game: String,
    /// Delimiter override, if one was given at upload.
    pub delimiter: Option<String>,
    /// Raw size in bytes.
    pub size_bytes: usize,
    /// Upload timestamp.
    pub uploaded_at: DateTime<Utc>,
}

impl From<&UploadedFile> for UploadedFileDto {
    fn from(file: &UploadedFile) -> Self {
        Self {
            file_id: *file.file_id.as_uuid(),
            file_name: file.source.name.clone(),
            game: file.source.game.to_string(),
            delimiter: file.source.delimiter.map(|d| d.to_string()),
            size_bytes: file.source.bytes.len(),
            uploaded_at: file.uploaded_at,
        }
    }
}

/// Response body for `POST /sessions` and `GET /sessions/{id}`.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionResponse {
    /// Session identifier.
    pub session_id: uuid::Uuid,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last upload or removal.
    pub last_modified_at: DateTime<Utc>,
    /// Uploaded files in upload order.
    pub files: Vec<UploadedFileDto>,
}

impl From<&UploadSession> for SessionResponse {
    fn from(session: &UploadSession) -> Self {
        Self {
            session_id: *session.session_id.as_uuid(),
            created_at: session.created_at,
            last_modified_at: session.last_modified_at,
            files: session.files.iter().map(UploadedFileDto::from).collect(),
        }
    }
}

/// Session summary for list responses.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionSummaryDto {
    /// Session identifier.
    pub session_id: uuid::Uuid,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last upload or removal.
    pub last_modified_at: DateTime<Utc>,
    /// Number of uploaded files.
    pub file_count: usize,
    /// Sum of uploaded file sizes.
    pub total_bytes: usize,
}

impl From<SessionSummary> for SessionSummaryDto {
    fn from(summary: SessionSummary) -> Self {
        Self {
            session_id: *summary.session_id.as_uuid(),
            created_at: summary.created_at,
            last_modified_at: summary.last_modified_at,
            file_count: summary.file_count,
            total_bytes: summary.total_bytes,
        }
    }
}

/// Response body for `GET /sessions`.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionListResponse {
    /// Sessions ordered by creation time.
    pub data: Vec<SessionSummaryDto>,
    /// Number of open sessions.
    pub total: usize,
}

/// Query parameters for `POST /sessions/{id}/files`.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UploadParams {
    /// Game label for every row of the file. Required, non-empty.
    pub game: String,
    /// File name shown in the report. Generated when absent.
    #[serde(default)]
    pub file_name: Option<String>,
    /// Delimiter override: `auto`, `semicolon`, `comma`, `tab`, `pipe` or a
    /// single punctuation character.
    #[serde(default)]
    pub delimiter: Option<String>,
}

/// Response body for `POST /sessions/{id}/files` (201 Created).
#[derive(Debug, Serialize, ToSchema)]
pub struct UploadResponse {
    /// Session the file was added to.
    pub session_id: uuid::Uuid,
    /// New file identifier.
    pub file_id: uuid::Uuid,
    /// Stored file details.
    pub file: UploadedFileDto,
}
