//! Report service: session management and report orchestration.

use std::sync::Arc;

use crate::domain::{
    DelimiterStrategy, FileId, GameLabel, IngestOptions, SessionId, SessionRegistry,
    SessionSummary, SourceFile, UploadSession,
};
use crate::error::ReportError;

use super::pipeline::{Report, generate_report};

/// Orchestration layer between the HTTP handlers and the report core.
///
/// Owns a reference to the [`SessionRegistry`] for upload state and the
/// [`IngestOptions`] applied to every run. Report generation copies the
/// session's file list under a read lock, releases it, then runs the
/// stateless pipeline.
#[derive(Debug, Clone)]
pub struct ReportService {
    registry: Arc<SessionRegistry>,
    options: IngestOptions,
}

impl ReportService {
    /// Creates a new `ReportService`.
    #[must_use]
    pub fn new(registry: Arc<SessionRegistry>, options: IngestOptions) -> Self {
        Self { registry, options }
    }

    /// Returns a reference to the inner [`SessionRegistry`].
    #[must_use]
    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    /// Ingestion options applied to every report run.
    #[must_use]
    pub fn ingest_options(&self) -> &IngestOptions {
        &self.options
    }

    /// Opens an empty upload session.
    ///
    /// # Errors
    ///
    /// Returns a [`ReportError`] if the registry rejects the session.
    pub async fn open_session(&self) -> Result<UploadSession, ReportError> {
        let session = UploadSession::new(SessionId::new());
        let snapshot = session.clone();
        let session_id = self.registry.insert(session).await?;
        tracing::info!(%session_id, "session opened");
        Ok(snapshot)
    }

    /// Drops a session and its uploads.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::SessionNotFound`] if the session does not exist.
    pub async fn close_session(&self, session_id: SessionId) -> Result<(), ReportError> {
        let session = self.registry.remove(session_id).await?;
        tracing::info!(%session_id, files = session.files.len(), "session closed");
        Ok(())
    }

    /// Returns a copy of the session.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::SessionNotFound`] if the session does not exist.
    pub async fn session(&self, session_id: SessionId) -> Result<UploadSession, ReportError> {
        let lock = self.registry.get(session_id).await?;
        let session = lock.read().await;
        Ok(session.clone())
    }

    /// Returns summaries of every open session.
    pub async fn list_sessions(&self) -> Vec<SessionSummary> {
        self.registry.list().await
    }

    /// Adds an uploaded file to a session.
    ///
    /// `game` is the operator's label for every row of the file and must not
    /// be empty. `delimiter` optionally overrides detection for this file.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::InvalidGameLabel`] for a blank label,
    /// [`ReportError::InvalidRequest`] for an unsupported delimiter or an
    /// empty body, and [`ReportError::SessionNotFound`] if the session does
    /// not exist.
    pub async fn upload(
        &self,
        session_id: SessionId,
        file_name: Option<&str>,
        game: &str,
        delimiter: Option<&str>,
        bytes: &[u8],
    ) -> Result<FileId, ReportError> {
        let game = GameLabel::new(game)
            .ok_or_else(|| ReportError::InvalidGameLabel("must not be empty".to_string()))?;
        let delimiter = delimiter
            .map(str::parse::<DelimiterStrategy>)
            .transpose()
            .map_err(ReportError::InvalidRequest)?;
        if bytes.is_empty() {
            return Err(ReportError::InvalidRequest("empty upload body".to_string()));
        }

        let lock = self.registry.get(session_id).await?;
        let mut session = lock.write().await;

        let name = match file_name.map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => format!("upload-{}.csv", session.files.len() + 1),
        };
        let source = SourceFile {
            name,
            game,
            bytes: Arc::from(bytes),
            delimiter,
        };
        tracing::info!(
            %session_id,
            file = %source.name,
            game = %source.game,
            bytes = bytes.len(),
            "file uploaded"
        );
        Ok(session.add_file(source))
    }

    /// Removes an uploaded file from a session.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::SessionNotFound`] or
    /// [`ReportError::FileNotFound`].
    pub async fn remove_file(
        &self,
        session_id: SessionId,
        file_id: FileId,
    ) -> Result<(), ReportError> {
        let lock = self.registry.get(session_id).await?;
        let mut session = lock.write().await;
        let removed = session
            .remove_file(file_id)
            .ok_or(ReportError::FileNotFound(*file_id.as_uuid()))?;
        tracing::info!(%session_id, %file_id, file = %removed.source.name, "file removed");
        Ok(())
    }

    /// Runs the report pipeline over a session's current uploads.
    ///
    /// The pipeline is CPU-bound and runs on the blocking thread pool.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::SessionNotFound`] if the session does not exist
    /// and [`ReportError::Internal`] if the pipeline task fails.
    pub async fn report(&self, session_id: SessionId) -> Result<Report, ReportError> {
        let sources = {
            let lock = self.registry.get(session_id).await?;
            let session = lock.read().await;
            session.sources()
        };
        let options = self.options.clone();
        tokio::task::spawn_blocking(move || generate_report(&sources, &options))
            .await
            .map_err(|e| ReportError::Internal(format!("report task failed: {e}")))
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::service::pipeline::ReportStatus;

    const VALID: &str = "Client_ID;Nome;Sobrenome;Hora;Quant;Gastos;Ganhos;Resultado\n\
                         1;Ana;Silva;01/05/2024 21:10:00;3;R$30,00;R$90,00;R$-60,00\n";

    fn make_service() -> ReportService {
        ReportService::new(Arc::new(SessionRegistry::new()), IngestOptions::default())
    }

    async fn open(service: &ReportService) -> SessionId {
        let Ok(session) = service.open_session().await else {
            panic!("session should open");
        };
        session.session_id
    }

    #[tokio::test]
    async fn upload_then_report() {
        let service = make_service();
        let id = open(&service).await;

        let uploaded = service
            .upload(id, Some("roleta.csv"), "Roleta", None, VALID.as_bytes())
            .await;
        assert!(uploaded.is_ok());

        let Ok(report) = service.report(id).await else {
            panic!("report should build");
        };
        assert_eq!(report.status, ReportStatus::Ready);
        assert_eq!(report.by_game.len(), 1);
        assert_eq!(report.ingested.first().map(|f| f.file.as_str()), Some("roleta.csv"));
    }

    #[tokio::test]
    async fn blank_game_label_is_rejected() {
        let service = make_service();
        let id = open(&service).await;
        let result = service.upload(id, None, "   ", None, VALID.as_bytes()).await;
        assert!(matches!(result, Err(ReportError::InvalidGameLabel(_))));
        let Ok(session) = service.session(id).await else {
            panic!("session should exist");
        };
        assert!(session.files.is_empty());
    }

    #[tokio::test]
    async fn bad_delimiter_and_empty_body_are_rejected() {
        let service = make_service();
        let id = open(&service).await;
        let bad_delim = service
            .upload(id, None, "Roleta", Some("::"), VALID.as_bytes())
            .await;
        assert!(matches!(bad_delim, Err(ReportError::InvalidRequest(_))));
        let empty = service.upload(id, None, "Roleta", None, b"").await;
        assert!(matches!(empty, Err(ReportError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn unnamed_uploads_get_sequential_names() {
        let service = make_service();
        let id = open(&service).await;
        let _ = service.upload(id, None, "Roleta", None, VALID.as_bytes()).await;
        let _ = service.upload(id, Some("  "), "Slots", None, VALID.as_bytes()).await;
        let Ok(session) = service.session(id).await else {
            panic!("session should exist");
        };
        let names: Vec<&str> = session.files.iter().map(|f| f.source.name.as_str()).collect();
        assert_eq!(names, vec!["upload-1.csv", "upload-2.csv"]);
    }

    #[tokio::test]
    async fn removed_file_leaves_report() {
        let service = make_service();
        let id = open(&service).await;
        let Ok(file_id) = service.upload(id, None, "Roleta", None, VALID.as_bytes()).await else {
            panic!("upload should succeed");
        };
        assert!(service.remove_file(id, file_id).await.is_ok());
        assert!(matches!(
            service.remove_file(id, file_id).await,
            Err(ReportError::FileNotFound(_))
        ));

        let Ok(report) = service.report(id).await else {
            panic!("report should build");
        };
        assert_eq!(report.status, ReportStatus::NothingToReport);
    }

    #[tokio::test]
    async fn closed_session_is_gone() {
        let service = make_service();
        let id = open(&service).await;
        assert_eq!(service.list_sessions().await.len(), 1);
        assert!(service.close_session(id).await.is_ok());
        assert!(matches!(
            service.report(id).await,
            Err(ReportError::SessionNotFound(_))
        ));
    }

    #[tokio::test]
    async fn explicit_delimiter_override_is_stored() {
        let service = make_service();
        let id = open(&service).await;
        let _ = service
            .upload(id, None, "Roleta", Some("semicolon"), VALID.as_bytes())
            .await;
        let Ok(session) = service.session(id).await else {
            panic!("session should exist");
        };
        assert_eq!(
            session.files.first().and_then(|f| f.source.delimiter),
            Some(DelimiterStrategy::Explicit(b';'))
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_reports_run_off_the_async_workers() {
        let service = make_service();
        let id = open(&service).await;
        let _ = service.upload(id, None, "Roleta", None, VALID.as_bytes()).await;

        let (a, b) = tokio::join!(service.report(id), service.report(id));
        let (Ok(a), Ok(b)) = (a, b) else {
            panic!("both reports should build");
        };
        assert_eq!(a.grand_total, b.grand_total);
        assert_eq!(a.status, ReportStatus::Ready);
    }
}
