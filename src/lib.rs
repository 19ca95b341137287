//! # floor-report
//!
//! CSV ingestion and hourly aggregation service for casino gaming terminal
//! exports.
//!
//! Operators upload one CSV export per game into a session. Each report run
//! normalizes the columns, parses locale-formatted money and timestamps,
//! buckets rows into hourly intervals, and returns per-interval, per-game
//! and per-player sums with RTP and the loss-making buckets.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP)
//!     │
//!     ├── REST Handlers (api/)
//!     │
//!     ├── ReportService (service/)
//!     ├── Report pipeline (service/pipeline)
//!     │
//!     ├── SessionRegistry (domain/)
//!     ├── RecordIngestor ─► IntervalAssigner ─► AggregationEngine (domain/)
//!     │
//!     └── ColumnNormalizer, MonetaryParser, TimestampParser (domain/)
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod service;
