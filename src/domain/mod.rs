//! Domain layer: records, normalization, ingestion, aggregation, sessions.
//!
//! This module contains the report core. Leaves first: column
//! normalization, monetary and timestamp parsing, per-file ingestion,
//! hourly interval assignment and the aggregation engine. The session
//! types hold the operator's uploads between requests.

pub mod aggregation;
pub mod columns;
pub mod ids;
pub mod ingest;
pub mod interval;
pub mod money;
pub mod record;
pub mod session;
pub mod session_registry;
pub mod timestamp;

pub use aggregation::{
    AggregationEngine, AggregationRow, GroupKey, LossBucket, LossView, MagnitudeGuard, PlayerScope,
    Rtp, Totals,
};
pub use columns::{CanonicalColumn, ColumnMapping, ColumnNormalizer};
pub use ids::{FileId, SessionId};
pub use ingest::{
    BatchOutcome, DelimiterStrategy, FileBatch, IngestError, IngestOptions, IngestStats,
    RecordIngestor, SourceFile,
};
pub use interval::{Interval, IntervalAssigner};
pub use money::{MonetaryParser, ParsedAmount};
pub use record::{GameLabel, Record};
pub use session::{SessionSummary, UploadSession, UploadedFile};
pub use session_registry::SessionRegistry;
pub use timestamp::TimestampParser;
