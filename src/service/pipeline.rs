//! Stateless report pipeline.
//!
//! ```text
//! files ─► RecordIngestor (per file) ─► concatenated records
//!       ─► IntervalAssigner (per record) ─► AggregationEngine (batch)
//! ```
//!
//! Every call starts from raw uploads and recomputes everything; nothing
//! is cached between runs.

use chrono::{DateTime, Utc};

use crate::domain::{
    AggregationEngine, AggregationRow, GameLabel, IngestError, IngestOptions, IngestStats,
    LossBucket, LossView, PlayerScope, Record, RecordIngestor, SourceFile, Totals,
};

/// Terminal state of a report run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportStatus {
    /// At least one file was ingested.
    Ready,
    /// No file was ingested; all tables are empty.
    NothingToReport,
}

/// Summary of one accepted file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSummary {
    /// File name.
    pub file: String,
    /// Game label stamped on the file's rows.
    pub game: GameLabel,
    /// Delimiter used to split the file.
    pub delimiter: char,
    /// Coercion counters.
    pub stats: IngestStats,
    /// Line numbers with unparseable timestamps.
    pub missing_timestamp_lines: Vec<u64>,
}

/// Everything one report run produces.
#[derive(Debug, Clone)]
pub struct Report {
    /// Terminal state.
    pub status: ReportStatus,
    /// When the run finished.
    pub generated_at: DateTime<Utc>,
    /// Accepted files, in upload order.
    pub ingested: Vec<FileSummary>,
    /// Rejected files, in upload order.
    pub rejected: Vec<IngestError>,
    /// Coercion counters summed over accepted files.
    pub stats: IngestStats,
    /// Sums per (game, interval).
    pub by_game_interval: Vec<AggregationRow>,
    /// Sums per game.
    pub by_game: Vec<AggregationRow>,
    /// Sums per (game, player) over all rows.
    pub by_player: Vec<AggregationRow>,
    /// Sums over every record.
    pub grand_total: Totals,
    records: Vec<Record>,
}

impl Report {
    /// Concatenated records the views were computed from.
    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Loss-making buckets of `view` with their contributing players.
    #[must_use]
    pub fn loss_buckets(&self, view: LossView) -> Vec<LossBucket> {
        AggregationEngine::new(&self.records).loss_buckets(view)
    }

    /// Per-player drill-down restricted by `scope`.
    #[must_use]
    pub fn players(&self, scope: &PlayerScope) -> Vec<AggregationRow> {
        AggregationEngine::new(&self.records).by_player(scope)
    }
}

/// Ingests `files` and computes every view.
///
/// Rejected files are listed in [`Report::rejected`] and never affect the
/// rows of other files. When nothing is ingested the report is empty with
/// [`ReportStatus::NothingToReport`].
#[must_use]
pub fn generate_report(files: &[SourceFile], options: &IngestOptions) -> Report {
    let outcome = RecordIngestor::new(options).ingest_all(files);
    let records = outcome.records();
    let stats = outcome.stats();

    let status = if outcome.batches.is_empty() {
        ReportStatus::NothingToReport
    } else {
        ReportStatus::Ready
    };

    let ingested = outcome
        .batches
        .into_iter()
        .map(|batch| FileSummary {
            file: batch.file,
            game: batch.game,
            delimiter: char::from(batch.delimiter),
            stats: batch.stats,
            missing_timestamp_lines: batch.missing_timestamp_lines,
        })
        .collect();

    let engine = AggregationEngine::new(&records);
    let by_game_interval = engine.by_game_interval();
    let by_game = engine.by_game();
    let by_player = engine.by_player(&PlayerScope::default());
    let grand_total = engine.grand_total();

    tracing::info!(
        files = files.len(),
        rejected = outcome.errors.len(),
        rows = stats.rows,
        coerced_amounts = stats.coerced_amounts,
        coerced_round_counts = stats.coerced_round_counts,
        missing_timestamps = stats.missing_timestamps,
        net_result = %grand_total.net_result,
        "report generated"
    );

    Report {
        status,
        generated_at: Utc::now(),
        ingested,
        rejected: outcome.errors,
        stats,
        by_game_interval,
        by_game,
        by_player,
        grand_total,
        records,
    }
}
