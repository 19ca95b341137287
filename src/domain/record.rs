//! Wagering records and the operator-supplied game label.

use std::fmt;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Operator-supplied game label attached to every record of an upload.
///
/// The label is never inferred from file content. It can only be built
/// from a non-empty string; surrounding whitespace is trimmed.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct GameLabel(String);

impl GameLabel {
    /// Creates a label from operator input.
    ///
    /// Returns `None` when the input is empty or whitespace only.
    #[must_use]
    pub fn new(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    /// Returns the label text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GameLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for GameLabel {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value).ok_or_else(|| "game label must not be empty".to_string())
    }
}

impl From<GameLabel> for String {
    fn from(label: GameLabel) -> Self {
        label.0
    }
}

/// One wagering transaction line after normalization.
///
/// Records are built once by the ingestor and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    /// Opaque player identifier, stable across files.
    pub client_id: String,
    /// Player first name (display only).
    pub first_name: String,
    /// Player last name (display only).
    pub last_name: String,
    /// Local wall-clock time of the line; `None` when unparseable.
    pub timestamp: Option<NaiveDateTime>,
    /// Number of rounds played.
    pub round_count: u64,
    /// Money spent by the player.
    pub wagered: Decimal,
    /// Money paid out to the player.
    pub won: Decimal,
    /// Net result as authored in the source export.
    pub net_result: Decimal,
    /// Game label assigned at ingestion.
    pub game: GameLabel,
}
