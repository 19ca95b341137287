//! Service configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`). Ingestion settings are grouped into
//! [`IngestOptions`] and shared by every report run.

use std::net::SocketAddr;

use crate::domain::{DelimiterStrategy, IngestOptions};

/// Top-level service configuration.
///
/// Loaded once at startup via [`ReportConfig::from_env`].
#[derive(Debug, Clone)]
pub struct ReportConfig {
    /// Socket address to bind the HTTP server to (e.g. `0.0.0.0:3000`).
    pub listen_addr: SocketAddr,

    /// Maximum accepted request body, in bytes.
    pub max_upload_bytes: usize,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Ingestion settings applied to every uploaded file.
    pub ingest: IngestOptions,
}

impl ReportConfig {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to defaults when a variable is not set.
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns an error if `LISTEN_ADDR` cannot be parsed as a
    /// [`SocketAddr`] or `CSV_DELIMITER` names an unsupported delimiter.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let listen_addr: SocketAddr = std::env::var("LISTEN_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
            .parse()?;

        let delimiter: DelimiterStrategy = std::env::var("CSV_DELIMITER")
            .unwrap_or_else(|_| "auto".to_string())
            .parse()
            .map_err(anyhow::Error::msg)?;

        let defaults = IngestOptions::default();
        let ingest = IngestOptions {
            trust_column_order: parse_env_bool("TRUST_COLUMN_ORDER", defaults.trust_column_order),
            delimiter,
            currency_prefix: std::env::var("CURRENCY_PREFIX").unwrap_or(defaults.currency_prefix),
            day_first: parse_env_bool("DAY_FIRST", defaults.day_first),
            latin1_fallback: parse_env_bool("LATIN1_FALLBACK", defaults.latin1_fallback),
            sample_lines: parse_env("DELIMITER_SAMPLE_LINES", defaults.sample_lines),
        };

        Ok(Self {
            listen_addr,
            max_upload_bytes: parse_env("MAX_UPLOAD_BYTES", 10 * 1024 * 1024),
            request_timeout_secs: parse_env("REQUEST_TIMEOUT_SECS", 30),
            ingest,
        })
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            max_upload_bytes: 10 * 1024 * 1024,
            request_timeout_secs: 30,
            ingest: IngestOptions::default(),
        }
    }
}

/// Parses an environment variable as `T`, returning `default` on missing
/// or invalid values.
fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Parses an environment variable as a boolean. Accepts `"true"`, `"1"`,
/// `"false"`, `"0"` (case-insensitive). Returns `default` otherwise.
fn parse_env_bool(key: &str, default: bool) -> bool {
    parse_bool(std::env::var(key).ok().as_deref(), default)
}

fn parse_bool(value: Option<&str>, default: bool) -> bool {
    match value.map(str::to_ascii_lowercase).as_deref() {
        Some("true" | "1") => true,
        Some("false" | "0") => false,
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bool_parsing() {
        assert!(parse_bool(Some("TRUE"), false));
        assert!(parse_bool(Some("1"), false));
        assert!(!parse_bool(Some("False"), true));
        assert!(!parse_bool(Some("0"), true));
        assert!(parse_bool(Some("maybe"), true));
        assert!(!parse_bool(None, false));
    }

    #[test]
    fn defaults_trust_column_order() {
        let config = ReportConfig::default();
        assert!(config.ingest.trust_column_order);
        assert_eq!(config.ingest.delimiter, DelimiterStrategy::Auto);
        assert_eq!(config.ingest.currency_prefix, "R$");
        assert_eq!(config.listen_addr.port(), 3000);
    }
}
