//! Report DTOs: full report, loss buckets and player drill-down.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::common_dto::{AggregationRowDto, IngestStatsDto, TotalsDto, rows_to_dto};
use crate::domain::{IngestError, LossBucket};
use crate::service::{FileSummary, Report, ReportStatus};

/// Wire form of [`ReportStatus`].
#[must_use]
pub const fn status_str(status: ReportStatus) -> &'static str {
    match status {
        ReportStatus::Ready => "ready",
        ReportStatus::NothingToReport => "nothing_to_report",
    }
}

/// One accepted file.
#[derive(Debug, Serialize, ToSchema)]
pub struct IngestedFileDto {
    /// File name.
    pub file: String,
    /// Game label.
    pub game: String,
    /// Delimiter used to split the file.
    pub delimiter: String,
    /// Coercion counters for this file.
    pub stats: IngestStatsDto,
    /// CSV line numbers whose timestamp could not be parsed.
    pub missing_timestamp_lines: Vec<u64>,
}

impl From<&FileSummary> for IngestedFileDto {
    fn from(summary: &FileSummary) -> Self {
        let delimiter = match summary.delimiter {
            '\t' => "tab".to_string(),
            other => other.to_string(),
        };
        Self {
            file: summary.file.clone(),
            game: summary.game.to_string(),
            delimiter,
            stats: IngestStatsDto::from(&summary.stats),
            missing_timestamp_lines: summary.missing_timestamp_lines.clone(),
        }
    }
}

/// One rejected file.
#[derive(Debug, Serialize, ToSchema)]
pub struct RejectedFileDto {
    /// File name.
    pub file: String,
    /// `schema_mismatch` or `unreadable_file`.
    pub kind: String,
    /// Column count seen in the header, for schema mismatches.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observed_columns: Option<usize>,
    /// What went wrong and how to correct it.
    pub message: String,
}

impl From<&IngestError> for RejectedFileDto {
    fn from(err: &IngestError) -> Self {
        match err {
            IngestError::SchemaMismatch {
                file,
                observed,
                detail,
            } => Self {
                file: file.clone(),
                kind: "schema_mismatch".to_string(),
                observed_columns: Some(*observed),
                message: detail.clone(),
            },
            IngestError::UnreadableFile { file, reason } => Self {
                file: file.clone(),
                kind: "unreadable_file".to_string(),
                observed_columns: None,
                message: reason.clone(),
            },
        }
    }
}

/// Response body for `GET /sessions/{id}/report`.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReportResponse {
    /// `ready` or `nothing_to_report`.
    pub status: String,
    /// Generation timestamp.
    pub generated_at: DateTime<Utc>,
    /// Accepted files.
    pub ingested: Vec<IngestedFileDto>,
    /// Rejected files.
    pub rejected: Vec<RejectedFileDto>,
    /// Coercion counters over accepted files.
    pub stats: IngestStatsDto,
    /// Sums per game and hourly interval.
    pub by_game_interval: Vec<AggregationRowDto>,
    /// Sums per game.
    pub by_game: Vec<AggregationRowDto>,
    /// Sums per game and player.
    pub by_player: Vec<AggregationRowDto>,
    /// Sums over every ingested row.
    pub grand_total: TotalsDto,
}

impl From<&Report> for ReportResponse {
    fn from(report: &Report) -> Self {
        Self {
            status: status_str(report.status).to_string(),
            generated_at: report.generated_at,
            ingested: report.ingested.iter().map(IngestedFileDto::from).collect(),
            rejected: report.rejected.iter().map(RejectedFileDto::from).collect(),
            stats: IngestStatsDto::from(&report.stats),
            by_game_interval: rows_to_dto(&report.by_game_interval),
            by_game: rows_to_dto(&report.by_game),
            by_player: rows_to_dto(&report.by_player),
            grand_total: TotalsDto::from(&report.grand_total),
        }
    }
}

/// Query parameters for `GET /sessions/{id}/report/losses`.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LossParams {
    /// `intervals` (default) or `daily`.
    #[serde(default)]
    pub view: Option<String>,
}

/// A loss-making bucket with its contributing players.
#[derive(Debug, Serialize, ToSchema)]
pub struct LossBucketDto {
    /// The loss-making bucket.
    pub bucket: AggregationRowDto,
    /// Per-player sums over the bucket's losing rows, by player.
    pub contributors: Vec<AggregationRowDto>,
}

impl From<&LossBucket> for LossBucketDto {
    fn from(bucket: &LossBucket) -> Self {
        Self {
            bucket: AggregationRowDto::from(&bucket.bucket),
            contributors: rows_to_dto(&bucket.contributors),
        }
    }
}

/// Response body for `GET /sessions/{id}/report/losses`.
#[derive(Debug, Serialize, ToSchema)]
pub struct LossReportResponse {
    /// `ready` or `nothing_to_report`.
    pub status: String,
    /// View used: `intervals` or `daily`.
    pub view: String,
    /// Loss-making buckets, worst first.
    pub buckets: Vec<LossBucketDto>,
}

/// Query parameters for `GET /sessions/{id}/report/players`.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PlayerParams {
    /// Restrict to one game label.
    #[serde(default)]
    pub game: Option<String>,
    /// Restrict to one interval, e.g. `09:00 - 10:00` or `09:00`.
    #[serde(default)]
    pub interval: Option<String>,
    /// Keep only rows whose own net result is negative.
    #[serde(default)]
    pub losing_rows_only: bool,
}

/// Response body for `GET /sessions/{id}/report/players`.
#[derive(Debug, Serialize, ToSchema)]
pub struct PlayerReportResponse {
    /// `ready` or `nothing_to_report`.
    pub status: String,
    /// Per-player sums in the requested scope.
    pub players: Vec<AggregationRowDto>,
}
