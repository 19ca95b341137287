//! Per-file ingestion: decoding, delimiter detection, normalization and
//! row conversion into [`Record`]s.
//!
//! A file either ingests completely or is rejected with an [`IngestError`];
//! there is no partial ingestion. Inside an accepted file, unreadable cells
//! are coerced locally and counted in [`IngestStats`].

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;

use super::aggregation::MagnitudeGuard;
use super::columns::{CanonicalColumn, ColumnMapping, ColumnNormalizer, SchemaError};
use super::money::MonetaryParser;
use super::record::{GameLabel, Record};
use super::timestamp::TimestampParser;

/// Delimiters tried by automatic detection, in preference order.
pub const DELIMITER_CANDIDATES: [u8; 4] = [b';', b',', b'\t', b'|'];

/// How the field delimiter of a file is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DelimiterStrategy {
    /// Sniff the delimiter from the first lines of the file.
    #[default]
    Auto,
    /// Use this byte.
    Explicit(u8),
}

impl FromStr for DelimiterStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" | "" => Ok(Self::Auto),
            ";" | "semicolon" => Ok(Self::Explicit(b';')),
            "," | "comma" => Ok(Self::Explicit(b',')),
            "\t" | "tab" | "\\t" => Ok(Self::Explicit(b'\t')),
            "|" | "pipe" => Ok(Self::Explicit(b'|')),
            other => {
                let mut bytes = other.bytes();
                match (bytes.next(), bytes.next()) {
                    (Some(b), None) if b.is_ascii_punctuation() => Ok(Self::Explicit(b)),
                    _ => Err(format!("unsupported delimiter: {s:?}")),
                }
            }
        }
    }
}

impl fmt::Display for DelimiterStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => f.write_str("auto"),
            Self::Explicit(b'\t') => f.write_str("tab"),
            Self::Explicit(b) => write!(f, "{}", char::from(*b)),
        }
    }
}

impl Serialize for DelimiterStrategy {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Ingestion settings shared by every file of a report run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestOptions {
    /// Rename columns by position instead of by header text.
    pub trust_column_order: bool,
    /// Default delimiter strategy; uploads may override it.
    pub delimiter: DelimiterStrategy,
    /// Literal currency prefix stripped from amounts.
    pub currency_prefix: String,
    /// Read `dd/mm/yyyy` rather than `mm/dd/yyyy`.
    pub day_first: bool,
    /// Decode non-UTF-8 input as Windows-1252 (the Latin-1 superset
    /// spreadsheets write) instead of rejecting it.
    pub latin1_fallback: bool,
    /// Number of non-blank lines inspected by delimiter detection.
    pub sample_lines: usize,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            trust_column_order: true,
            delimiter: DelimiterStrategy::Auto,
            currency_prefix: "R$".to_string(),
            day_first: true,
            latin1_fallback: true,
            sample_lines: 5,
        }
    }
}

/// One raw upload handed to the ingestor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// File name used in logs and error reports.
    pub name: String,
    /// Operator-supplied game label for every row.
    pub game: GameLabel,
    /// Raw file contents.
    pub bytes: Arc<[u8]>,
    /// Per-file delimiter override.
    pub delimiter: Option<DelimiterStrategy>,
}

/// Per-file rejection reasons.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IngestError {
    /// The header does not resolve to the canonical 8 columns.
    #[error("{file}: schema mismatch ({observed} columns): {detail}")]
    SchemaMismatch {
        /// File name.
        file: String,
        /// Column count observed in the header row.
        observed: usize,
        /// What went wrong and how to correct it.
        detail: String,
    },

    /// The bytes cannot be decoded or parsed as a table.
    #[error("{file}: unreadable file: {reason}")]
    UnreadableFile {
        /// File name.
        file: String,
        /// Decoder or parser failure.
        reason: String,
    },
}

impl IngestError {
    /// Name of the rejected file.
    #[must_use]
    pub fn file(&self) -> &str {
        match self {
            Self::SchemaMismatch { file, .. } | Self::UnreadableFile { file, .. } => file,
        }
    }
}

/// Coercion counters for one or more files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct IngestStats {
    /// Rows ingested.
    pub rows: usize,
    /// Monetary cells coerced to zero.
    pub coerced_amounts: usize,
    /// Round-count cells coerced to zero.
    pub coerced_round_counts: usize,
    /// Rows whose timestamp could not be parsed.
    pub missing_timestamps: usize,
}

impl IngestStats {
    /// Adds `other` into `self`.
    pub fn absorb(&mut self, other: &Self) {
        self.rows += other.rows;
        self.coerced_amounts += other.coerced_amounts;
        self.coerced_round_counts += other.coerced_round_counts;
        self.missing_timestamps += other.missing_timestamps;
    }
}

/// The records of one successfully ingested file.
#[derive(Debug, Clone)]
pub struct FileBatch {
    /// File name.
    pub file: String,
    /// Game label stamped on every record.
    pub game: GameLabel,
    /// Delimiter actually used.
    pub delimiter: u8,
    /// Ingested rows, in file order.
    pub records: Vec<Record>,
    /// Coercion counters.
    pub stats: IngestStats,
    /// Line numbers (1-based, header is line 1) with unparseable timestamps.
    pub missing_timestamp_lines: Vec<u64>,
    /// Summed absolute amounts of the file's rows.
    pub magnitude: MagnitudeGuard,
}

/// Result of ingesting a whole batch of files.
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    /// Successfully ingested files, in input order.
    pub batches: Vec<FileBatch>,
    /// Rejected files, in input order.
    pub errors: Vec<IngestError>,
}

impl BatchOutcome {
    /// Concatenated records of every accepted file.
    #[must_use]
    pub fn records(&self) -> Vec<Record> {
        self.batches
            .iter()
            .flat_map(|b| b.records.iter().cloned())
            .collect()
    }

    /// Summed coercion counters of every accepted file.
    #[must_use]
    pub fn stats(&self) -> IngestStats {
        let mut total = IngestStats::default();
        for batch in &self.batches {
            total.absorb(&batch.stats);
        }
        total
    }
}

/// Reads raw uploads into validated [`Record`] batches.
#[derive(Debug, Clone)]
pub struct RecordIngestor {
    normalizer: ColumnNormalizer,
    money: MonetaryParser,
    timestamps: TimestampParser,
    delimiter: DelimiterStrategy,
    latin1_fallback: bool,
    sample_lines: usize,
}

impl RecordIngestor {
    /// Builds an ingestor from options.
    #[must_use]
    pub fn new(options: &IngestOptions) -> Self {
        Self {
            normalizer: ColumnNormalizer::new(options.trust_column_order),
            money: MonetaryParser::new(options.currency_prefix.clone()),
            timestamps: TimestampParser::new(options.day_first),
            delimiter: options.delimiter,
            latin1_fallback: options.latin1_fallback,
            sample_lines: options.sample_lines.max(1),
        }
    }

    /// Ingests every file. A rejected file never discards rows of another.
    ///
    /// A file whose amounts would overflow the sums of the files accepted
    /// before it is rejected as unreadable.
    #[must_use]
    pub fn ingest_all(&self, files: &[SourceFile]) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();
        let mut magnitude = MagnitudeGuard::default();
        for file in files {
            let result = self.ingest(file).and_then(|batch| {
                let merged = magnitude.checked_merge(&batch.magnitude).ok_or_else(|| {
                    unreadable(file, "amounts too large to sum with the files before it")
                })?;
                magnitude = merged;
                Ok(batch)
            });
            match result {
                Ok(batch) => outcome.batches.push(batch),
                Err(err) => {
                    tracing::warn!(file = %file.name, game = %file.game, error = %err, "file rejected");
                    outcome.errors.push(err);
                }
            }
        }
        outcome
    }

    /// Ingests one file.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::UnreadableFile`] when the bytes cannot be
    /// decoded or a row is malformed, and [`IngestError::SchemaMismatch`]
    /// when no delimiter yields a header matching the canonical schema.
    pub fn ingest(&self, file: &SourceFile) -> Result<FileBatch, IngestError> {
        let text = self.decode(file)?;
        let text = text.trim_start_matches('\u{feff}');
        if text.trim().is_empty() {
            return Err(unreadable(file, "file is empty"));
        }

        let candidates = match file.delimiter.unwrap_or(self.delimiter) {
            DelimiterStrategy::Explicit(b) => vec![b],
            DelimiterStrategy::Auto => rank_delimiters(text, self.sample_lines),
        };
        let auto_detected = candidates.len() > 1;

        let mut first_failure: Option<(u8, SchemaError)> = None;
        let mut first_read_failure: Option<IngestError> = None;
        for delimiter in &candidates {
            let headers = read_headers(text, *delimiter).map_err(|e| unreadable(file, &e))?;
            match self.normalizer.normalize(&headers) {
                Ok(mapping) => {
                    tracing::debug!(file = %file.name, delimiter = %char::from(*delimiter), "delimiter selected");
                    match self.read_rows(file, text, *delimiter, mapping) {
                        Ok(batch) => return Ok(batch),
                        Err(err) if auto_detected => {
                            tracing::debug!(
                                file = %file.name,
                                delimiter = %char::from(*delimiter),
                                error = %err,
                                "rows do not fit delimiter, trying next candidate"
                            );
                            first_read_failure.get_or_insert(err);
                        }
                        Err(err) => return Err(err),
                    }
                }
                Err(err) => {
                    if first_failure.is_none() {
                        first_failure = Some((*delimiter, err));
                    }
                }
            }
        }

        if let Some(err) = first_read_failure {
            return Err(err);
        }

        let Some((delimiter, err)) = first_failure else {
            return Err(unreadable(file, "no delimiter candidates"));
        };
        let mut detail = err.to_string();
        if auto_detected {
            detail.push_str(&format!(
                "; detected delimiter {:?} is implausible, upload again with an explicit delimiter",
                char::from(delimiter)
            ));
        }
        Err(IngestError::SchemaMismatch {
            file: file.name.clone(),
            observed: err.observed,
            detail,
        })
    }

    fn decode<'a>(&self, file: &'a SourceFile) -> Result<Cow<'a, str>, IngestError> {
        match std::str::from_utf8(&file.bytes) {
            Ok(text) => Ok(Cow::Borrowed(text)),
            Err(err) if self.latin1_fallback => {
                tracing::debug!(file = %file.name, error = %err, "decoding as windows-1252");
                let (text, _) = encoding_rs::WINDOWS_1252.decode_without_bom_handling(&file.bytes);
                Ok(text)
            }
            Err(err) => Err(unreadable(file, &format!("not valid UTF-8: {err}"))),
        }
    }

    fn read_rows(
        &self,
        file: &SourceFile,
        text: &str,
        delimiter: u8,
        mapping: ColumnMapping,
    ) -> Result<FileBatch, IngestError> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(text.as_bytes());

        let mut records = Vec::new();
        let mut stats = IngestStats::default();
        let mut missing_timestamp_lines = Vec::new();
        let mut magnitude = MagnitudeGuard::default();

        for row in reader.records() {
            let row = row.map_err(|e| unreadable(file, &csv_failure(&e)))?;
            if row.iter().all(str::is_empty) {
                continue;
            }
            let cell = |column: CanonicalColumn| row.get(mapping.index_of(column)).unwrap_or("");

            let mut amount = |column: CanonicalColumn| -> Decimal {
                let parsed = self.money.parse(cell(column));
                if parsed.coerced {
                    stats.coerced_amounts += 1;
                }
                parsed.value
            };
            let wagered = amount(CanonicalColumn::Wagered);
            let won = amount(CanonicalColumn::Won);
            let net_result = amount(CanonicalColumn::NetResult);
            magnitude = magnitude.checked_add(wagered, won, net_result).ok_or_else(|| {
                unreadable(
                    file,
                    &format!(
                        "line {}: amounts too large to sum exactly",
                        row.position().map_or(0, csv::Position::line)
                    ),
                )
            })?;

            let round_count = parse_round_count(cell(CanonicalColumn::RoundCount)).unwrap_or_else(|| {
                stats.coerced_round_counts += 1;
                0
            });

            let timestamp = self.timestamps.parse(cell(CanonicalColumn::Timestamp));
            if timestamp.is_none() {
                stats.missing_timestamps += 1;
                missing_timestamp_lines.push(row.position().map_or(0, csv::Position::line));
            }

            records.push(Record {
                client_id: cell(CanonicalColumn::ClientId).to_string(),
                first_name: cell(CanonicalColumn::FirstName).to_string(),
                last_name: cell(CanonicalColumn::LastName).to_string(),
                timestamp,
                round_count,
                wagered,
                won,
                net_result,
                game: file.game.clone(),
            });
        }
        stats.rows = records.len();

        if !missing_timestamp_lines.is_empty() {
            tracing::warn!(
                file = %file.name,
                count = missing_timestamp_lines.len(),
                lines = ?missing_timestamp_lines,
                "rows with unparseable timestamps excluded from interval views"
            );
        }
        tracing::info!(
            file = %file.name,
            game = %file.game,
            rows = stats.rows,
            coerced_amounts = stats.coerced_amounts,
            coerced_round_counts = stats.coerced_round_counts,
            "file ingested"
        );

        Ok(FileBatch {
            file: file.name.clone(),
            game: file.game.clone(),
            delimiter,
            records,
            stats,
            missing_timestamp_lines,
            magnitude,
        })
    }
}

fn unreadable(file: &SourceFile, reason: &str) -> IngestError {
    IngestError::UnreadableFile {
        file: file.name.clone(),
        reason: reason.to_string(),
    }
}

fn csv_failure(err: &csv::Error) -> String {
    match err.kind() {
        csv::ErrorKind::UnequalLengths {
            pos,
            expected_len,
            len,
        } => format!(
            "line {}: expected {expected_len} fields, found {len}",
            pos.as_ref().map_or(0, csv::Position::line)
        ),
        _ => err.to_string(),
    }
}

fn read_headers(text: &str, delimiter: u8) -> Result<Vec<String>, String> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());
    let headers = reader.headers().map_err(|e| e.to_string())?;
    Ok(headers.iter().map(str::to_string).collect())
}

/// Orders [`DELIMITER_CANDIDATES`] from most to least plausible for `text`.
///
/// A candidate is consistent when every sampled line splits into the same
/// number (> 1) of fields. Consistent candidates come first; within each
/// group a width of exactly 8 wins, then the wider split, then the
/// candidate order.
#[must_use]
pub fn rank_delimiters(text: &str, sample_lines: usize) -> Vec<u8> {
    let sample: Vec<&str> = text
        .lines()
        .filter(|l| !l.trim().is_empty())
        .take(sample_lines)
        .collect();
    let sample = sample.join("\n");

    let mut scored: Vec<(u8, bool, usize)> = DELIMITER_CANDIDATES
        .iter()
        .map(|&delimiter| {
            let (consistent, width) = split_profile(&sample, delimiter);
            (delimiter, consistent, width)
        })
        .collect();

    scored.sort_by_key(|&(_, consistent, width)| {
        (
            std::cmp::Reverse(consistent),
            std::cmp::Reverse(width == super::columns::CANONICAL_WIDTH),
            std::cmp::Reverse(width),
        )
    });
    scored.into_iter().map(|(delimiter, _, _)| delimiter).collect()
}

/// Returns (consistent, header width) for `sample` split by `delimiter`.
fn split_profile(sample: &str, delimiter: u8) -> (bool, usize) {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(sample.as_bytes());

    let mut width: Option<usize> = None;
    let mut consistent = true;
    for row in reader.records() {
        let Ok(row) = row else {
            return (false, width.unwrap_or(0));
        };
        match width {
            None => width = Some(row.len()),
            Some(w) if w != row.len() => consistent = false,
            Some(_) => {}
        }
    }
    let width = width.unwrap_or(0);
    (consistent && width > 1, width)
}

/// Parses a round count. Accepts `"12"`, `"12.0"`, `"12,0"` and grouped
/// integers such as `"1.234"`. Negative or fractional counts are rejected.
fn parse_round_count(raw: &str) -> Option<u64> {
    let text = raw.trim();
    if let Ok(n) = text.parse::<u64>() {
        return Some(n);
    }

    let mut groups = text.split('.');
    let head = groups.next()?;
    let tail: Vec<&str> = groups.collect();
    if !tail.is_empty()
        && !head.is_empty()
        && head.len() <= 3
        && tail.iter().all(|g| g.len() == 3 && g.bytes().all(|b| b.is_ascii_digit()))
    {
        return text.replace('.', "").parse::<u64>().ok();
    }

    let value = Decimal::from_str(&text.replace(',', ".")).ok()?;
    if value.is_sign_negative() || !value.fract().is_zero() {
        return None;
    }
    value.trunc().to_u64()
}
