//! Service layer: report orchestration.
//!
//! [`ReportService`] manages upload sessions and runs the stateless
//! [`pipeline::generate_report`] over a session's files.

pub mod pipeline;
pub mod report_service;

pub use pipeline::{FileSummary, Report, ReportStatus, generate_report};
pub use report_service::ReportService;
