//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::service::ReportService;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Report service for session management and report generation.
    pub report_service: Arc<ReportService>,
}

impl AppState {
    /// Wraps a [`ReportService`] for sharing across handlers.
    #[must_use]
    pub fn new(report_service: ReportService) -> Self {
        Self {
            report_service: Arc::new(report_service),
        }
    }
}
