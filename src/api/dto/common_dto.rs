//! Shared DTO types used across multiple endpoints.

use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{AggregationRow, GroupKey, IngestStats, Rtp, Totals};

/// Renders an RTP as a two-decimal string, or `None` when not applicable.
#[must_use]
pub fn rtp_string(rtp: Rtp) -> Option<String> {
    rtp.rounded().map(|value| value.to_string())
}

/// Summed fields plus derived RTP.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TotalsDto {
    /// Summed round count.
    pub round_count: u64,
    /// Summed amount wagered.
    pub wagered: String,
    /// Summed amount won.
    pub won: String,
    /// Summed net result as authored in the files.
    pub net_result: String,
    /// `won / wagered * 100`, rounded to 2 places.
    pub rtp_percent: Option<String>,
}

impl From<&Totals> for TotalsDto {
    fn from(totals: &Totals) -> Self {
        Self {
            round_count: totals.round_count,
            wagered: totals.wagered.to_string(),
            won: totals.won.to_string(),
            net_result: totals.net_result.to_string(),
            rtp_percent: rtp_string(totals.rtp()),
        }
    }
}

/// One grouped row, flattened.
///
/// Which key fields are present depends on the view: `interval` only for
/// per-interval rows, the player fields only for per-player rows.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AggregationRowDto {
    /// Game label.
    pub game: String,
    /// Hourly interval label, e.g. `"09:00 - 10:00"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval: Option<String>,
    /// Player identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    /// Player first name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    /// Player last name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    /// Summed fields.
    #[serde(flatten)]
    pub totals: TotalsDto,
}

impl From<&AggregationRow> for AggregationRowDto {
    fn from(row: &AggregationRow) -> Self {
        let totals = TotalsDto::from(&row.totals);
        match &row.key {
            GroupKey::GameInterval { game, interval } => Self {
                game: game.to_string(),
                interval: Some(interval.label()),
                client_id: None,
                first_name: None,
                last_name: None,
                totals,
            },
            GroupKey::Game { game } => Self {
                game: game.to_string(),
                interval: None,
                client_id: None,
                first_name: None,
                last_name: None,
                totals,
            },
            GroupKey::Player {
                game,
                client_id,
                first_name,
                last_name,
            } => Self {
                game: game.to_string(),
                interval: None,
                client_id: Some(client_id.clone()),
                first_name: Some(first_name.clone()),
                last_name: Some(last_name.clone()),
                totals,
            },
        }
    }
}

/// Converts a slice of rows.
#[must_use]
pub fn rows_to_dto(rows: &[AggregationRow]) -> Vec<AggregationRowDto> {
    rows.iter().map(AggregationRowDto::from).collect()
}

/// Coercion counters.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct IngestStatsDto {
    /// Rows ingested.
    pub rows: usize,
    /// Monetary cells coerced to zero.
    pub coerced_amounts: usize,
    /// Round counts coerced to zero.
    pub coerced_round_counts: usize,
    /// Rows whose timestamp could not be parsed.
    pub missing_timestamps: usize,
}

impl From<&IngestStats> for IngestStatsDto {
    fn from(stats: &IngestStats) -> Self {
        Self {
            rows: stats.rows,
            coerced_amounts: stats.coerced_amounts,
            coerced_round_counts: stats.coerced_round_counts,
            missing_timestamps: stats.missing_timestamps,
        }
    }
}
