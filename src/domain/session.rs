//! Upload session: the operator's accumulated file list.
//!
//! A session is owned by the caller (the HTTP layer) and handed to the
//! report pipeline as plain data. Nothing in it is persisted.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::ids::{FileId, SessionId};
use super::ingest::SourceFile;

/// One file uploaded into a session.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// File identifier (immutable after upload).
    pub file_id: FileId,
    /// Upload timestamp.
    pub uploaded_at: DateTime<Utc>,
    /// Raw contents plus game label and delimiter override.
    pub source: SourceFile,
}

/// Files accumulated across operator interactions.
#[derive(Debug, Clone)]
pub struct UploadSession {
    /// Session identifier (immutable after creation).
    pub session_id: SessionId,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Timestamp of the last upload or removal.
    pub last_modified_at: DateTime<Utc>,
    /// Uploaded files, in upload order.
    pub files: Vec<UploadedFile>,
}

impl UploadSession {
    /// Creates an empty session.
    #[must_use]
    pub fn new(session_id: SessionId) -> Self {
        let now = Utc::now();
        Self {
            session_id,
            created_at: now,
            last_modified_at: now,
            files: Vec::new(),
        }
    }

    /// Appends a file and returns its identifier.
    pub fn add_file(&mut self, source: SourceFile) -> FileId {
        let file_id = FileId::new();
        let now = Utc::now();
        self.files.push(UploadedFile {
            file_id,
            uploaded_at: now,
            source,
        });
        self.last_modified_at = now;
        file_id
    }

    /// Removes a file. Returns `None` when no such file exists.
    pub fn remove_file(&mut self, file_id: FileId) -> Option<UploadedFile> {
        let index = self.files.iter().position(|f| f.file_id == file_id)?;
        self.last_modified_at = Utc::now();
        Some(self.files.remove(index))
    }

    /// Sources of every uploaded file, in upload order.
    #[must_use]
    pub fn sources(&self) -> Vec<SourceFile> {
        self.files.iter().map(|f| f.source.clone()).collect()
    }

    /// Total uploaded bytes.
    #[must_use]
    pub fn total_bytes(&self) -> usize {
        self.files.iter().map(|f| f.source.bytes.len()).sum()
    }
}

/// Lightweight summary of a session for list endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    /// Session identifier.
    pub session_id: SessionId,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub last_modified_at: DateTime<Utc>,
    /// Number of uploaded files.
    pub file_count: usize,
    /// Total uploaded bytes.
    pub total_bytes: usize,
}

impl From<&UploadSession> for SessionSummary {
    fn from(session: &UploadSession) -> Self {
        Self {
            session_id: session.session_id,
            created_at: session.created_at,
            last_modified_at: session.last_modified_at,
            file_count: session.files.len(),
            total_bytes: session.total_bytes(),
        }
    }
}
