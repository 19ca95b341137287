//! Header normalization onto the canonical 8-column schema.
//!
//! Source exports disagree on header text (`Client_ID` vs `cliente id`,
//! `Hora` vs `Data/Hora`, stray BOM bytes). [`ColumnNormalizer`] resolves a
//! header row into a [`ColumnMapping`] that tells the ingestor which source
//! field holds each canonical column. Two strategies exist:
//!
//! - **positional**: the header must have exactly 8 fields and field *i* is
//!   canonical column *i*; header text is ignored.
//! - **by name**: each header is cleaned and matched against a small alias
//!   table; unmatched extra columns are ignored.

use std::fmt;

use serde::Serialize;

/// Number of logical columns every ingested file resolves to.
pub const CANONICAL_WIDTH: usize = 8;

/// The canonical columns, in positional order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalColumn {
    /// Opaque player identifier.
    ClientId,
    /// Player first name.
    FirstName,
    /// Player last name.
    LastName,
    /// Date-time of the line.
    Timestamp,
    /// Number of rounds played.
    RoundCount,
    /// Money spent.
    Wagered,
    /// Money paid out.
    Won,
    /// Net result as authored in the export.
    NetResult,
}

impl CanonicalColumn {
    /// All canonical columns in positional order.
    pub const ALL: [Self; CANONICAL_WIDTH] = [
        Self::ClientId,
        Self::FirstName,
        Self::LastName,
        Self::Timestamp,
        Self::RoundCount,
        Self::Wagered,
        Self::Won,
        Self::NetResult,
    ];

    /// Canonical snake_case name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::ClientId => "client_id",
            Self::FirstName => "first_name",
            Self::LastName => "last_name",
            Self::Timestamp => "timestamp",
            Self::RoundCount => "round_count",
            Self::Wagered => "wagered",
            Self::Won => "won",
            Self::NetResult => "net_result",
        }
    }

    /// Cleaned header spellings accepted for this column in by-name mode.
    ///
    /// Includes the Portuguese headers of the terminal exports.
    #[must_use]
    pub const fn aliases(self) -> &'static [&'static str] {
        match self {
            Self::ClientId => &[
                "client_id",
                "clientid",
                "cliente_id",
                "id_cliente",
                "cliente",
                "client",
                "player_id",
                "id",
            ],
            Self::FirstName => &["first_name", "firstname", "nome", "primeiro_nome", "name"],
            Self::LastName => &["last_name", "lastname", "sobrenome", "ultimo_nome", "surname"],
            Self::Timestamp => &[
                "timestamp",
                "hora",
                "data_hora",
                "datahora",
                "data",
                "datetime",
                "date_time",
                "date",
                "horario",
            ],
            Self::RoundCount => &[
                "round_count",
                "rounds",
                "rodadas",
                "quant",
                "quantidade",
                "qtd",
                "qtde",
                "plays",
            ],
            Self::Wagered => &[
                "wagered", "gastos", "gasto", "apostado", "aposta", "apostas", "bet", "bets",
                "spent",
            ],
            Self::Won => &[
                "won", "ganhos", "ganho", "premio", "premios", "win", "wins", "payout",
            ],
            Self::NetResult => &["net_result", "resultado", "result", "net", "saldo"],
        }
    }
}

impl fmt::Display for CanonicalColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Source field index of each canonical column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMapping {
    client_id: usize,
    first_name: usize,
    last_name: usize,
    timestamp: usize,
    round_count: usize,
    wagered: usize,
    won: usize,
    net_result: usize,
}

impl ColumnMapping {
    /// Identity mapping: field *i* is canonical column *i*.
    #[must_use]
    pub const fn positional() -> Self {
        Self {
            client_id: 0,
            first_name: 1,
            last_name: 2,
            timestamp: 3,
            round_count: 4,
            wagered: 5,
            won: 6,
            net_result: 7,
        }
    }

    /// Returns the source field index holding `column`.
    #[must_use]
    pub const fn index_of(&self, column: CanonicalColumn) -> usize {
        match column {
            CanonicalColumn::ClientId => self.client_id,
            CanonicalColumn::FirstName => self.first_name,
            CanonicalColumn::LastName => self.last_name,
            CanonicalColumn::Timestamp => self.timestamp,
            CanonicalColumn::RoundCount => self.round_count,
            CanonicalColumn::Wagered => self.wagered,
            CanonicalColumn::Won => self.won,
            CanonicalColumn::NetResult => self.net_result,
        }
    }

    fn set(&mut self, column: CanonicalColumn, index: usize) {
        let slot = match column {
            CanonicalColumn::ClientId => &mut self.client_id,
            CanonicalColumn::FirstName => &mut self.first_name,
            CanonicalColumn::LastName => &mut self.last_name,
            CanonicalColumn::Timestamp => &mut self.timestamp,
            CanonicalColumn::RoundCount => &mut self.round_count,
            CanonicalColumn::Wagered => &mut self.wagered,
            CanonicalColumn::Won => &mut self.won,
            CanonicalColumn::NetResult => &mut self.net_result,
        };
        *slot = index;
    }
}

/// A header row that cannot be resolved to the canonical schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaError {
    /// Number of fields observed in the header row.
    pub observed: usize,
    /// Canonical columns left unresolved (by-name mode only).
    pub unresolved: Vec<CanonicalColumn>,
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.unresolved.is_empty() {
            write!(
                f,
                "expected {CANONICAL_WIDTH} columns, found {}",
                self.observed
            )
        } else {
            let names: Vec<&str> = self.unresolved.iter().map(|c| c.name()).collect();
            write!(
                f,
                "could not resolve columns [{}] among {} header fields",
                names.join(", "),
                self.observed
            )
        }
    }
}

/// Resolves header rows onto the canonical schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnNormalizer {
    trust_column_order: bool,
}

impl ColumnNormalizer {
    /// Creates a normalizer. With `trust_column_order` the header text is
    /// ignored and only the field count is checked.
    #[must_use]
    pub const fn new(trust_column_order: bool) -> Self {
        Self { trust_column_order }
    }

    /// Returns `true` when renaming is positional.
    #[must_use]
    pub const fn trusts_column_order(&self) -> bool {
        self.trust_column_order
    }

    /// Resolves `headers` into a [`ColumnMapping`].
    ///
    /// # Errors
    ///
    /// Returns a [`SchemaError`] when the header does not have exactly
    /// [`CANONICAL_WIDTH`] fields (positional mode) or when a canonical
    /// column has no matching header (by-name mode).
    pub fn normalize<S: AsRef<str>>(&self, headers: &[S]) -> Result<ColumnMapping, SchemaError> {
        if self.trust_column_order {
            if headers.len() == CANONICAL_WIDTH {
                Ok(ColumnMapping::positional())
            } else {
                Err(SchemaError {
                    observed: headers.len(),
                    unresolved: Vec::new(),
                })
            }
        } else {
            Self::normalize_by_name(headers)
        }
    }

    fn normalize_by_name<S: AsRef<str>>(headers: &[S]) -> Result<ColumnMapping, SchemaError> {
        let cleaned: Vec<String> = headers.iter().map(|h| clean_header(h.as_ref())).collect();

        let mut mapping = ColumnMapping::positional();
        let mut unresolved = Vec::new();
        for column in CanonicalColumn::ALL {
            let aliases = column.aliases();
            match cleaned.iter().position(|h| aliases.contains(&h.as_str())) {
                Some(index) => mapping.set(column, index),
                None => unresolved.push(column),
            }
        }

        if unresolved.is_empty() {
            Ok(mapping)
        } else {
            Err(SchemaError {
                observed: headers.len(),
                unresolved,
            })
        }
    }
}

/// Cleans header text for alias matching.
///
/// Strips BOM artifacts, trims, lowercases, unifies space / `-` / `/` / `.`
/// into `_` and collapses repeated underscores.
#[must_use]
pub fn clean_header(raw: &str) -> String {
    let without_bom = raw
        .trim_start_matches('\u{feff}')
        .trim_start_matches("ï»¿")
        .trim();

    let mut out = String::with_capacity(without_bom.len());
    for ch in without_bom.chars().flat_map(char::to_lowercase) {
        let ch = if matches!(ch, ' ' | '\t' | '-' | '/' | '.') {
            '_'
        } else {
            ch
        };
        if ch == '_' && out.ends_with('_') {
            continue;
        }
        out.push(ch);
    }
    out.trim_matches('_').to_string()
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    const SOURCE_HEADERS: [&str; 8] = [
        "Client_ID",
        "Nome",
        "Sobrenome",
        "Hora",
        "Quant",
        "Gastos",
        "Ganhos",
        "Resultado",
    ];

    #[test]
    fn positional_ignores_header_text() {
        let normalizer = ColumnNormalizer::new(true);
        let headers = ["a", "b", "c", "d", "e", "f", "g", "h"];
        let Ok(mapping) = normalizer.normalize(&headers) else {
            panic!("8 columns must normalize");
        };
        assert_eq!(mapping, ColumnMapping::positional());
        assert_eq!(mapping.index_of(CanonicalColumn::NetResult), 7);
    }

    #[test]
    fn positional_rejects_wrong_width() {
        let normalizer = ColumnNormalizer::new(true);
        for width in [7usize, 9] {
            let headers = vec!["x"; width];
            let Err(err) = normalizer.normalize(&headers) else {
                panic!("{width} columns must be rejected");
            };
            assert_eq!(err.observed, width);
            assert!(err.unresolved.is_empty());
        }
    }

    #[test]
    fn by_name_resolves_source_headers() {
        let normalizer = ColumnNormalizer::new(false);
        let Ok(mapping) = normalizer.normalize(&SOURCE_HEADERS) else {
            panic!("source headers must resolve");
        };
        assert_eq!(mapping, ColumnMapping::positional());
    }

    #[test]
    fn by_name_handles_shuffled_and_extra_columns() {
        let normalizer = ColumnNormalizer::new(false);
        let headers = [
            "Resultado",
            "\u{feff}Client ID",
            "Terminal",
            "Nome",
            "Sobrenome",
            "Data/Hora",
            "Quant",
            "Gastos",
            "Ganhos",
        ];
        let Ok(mapping) = normalizer.normalize(&headers) else {
            panic!("shuffled headers must resolve");
        };
        assert_eq!(mapping.index_of(CanonicalColumn::NetResult), 0);
        assert_eq!(mapping.index_of(CanonicalColumn::ClientId), 1);
        assert_eq!(mapping.index_of(CanonicalColumn::Timestamp), 5);
        assert_eq!(mapping.index_of(CanonicalColumn::Won), 8);
    }

    #[test]
    fn by_name_reports_unresolved_columns() {
        let normalizer = ColumnNormalizer::new(false);
        let headers = ["Client_ID", "Nome", "Sobrenome", "Quant", "Gastos", "Ganhos"];
        let Err(err) = normalizer.normalize(&headers) else {
            panic!("missing columns must fail");
        };
        assert_eq!(err.observed, 6);
        assert_eq!(
            err.unresolved,
            vec![CanonicalColumn::Timestamp, CanonicalColumn::NetResult]
        );
        assert!(err.to_string().contains("timestamp, net_result"));
    }

    #[test]
    fn clean_header_unifies_separators() {
        assert_eq!(clean_header("ï»¿Client_ID"), "client_id");
        assert_eq!(clean_header("  Data / Hora "), "data_hora");
        assert_eq!(clean_header("data-hora"), "data_hora");
        assert_eq!(clean_header("Round  Count"), "round_count");
        assert_eq!(clean_header("net.result"), "net_result");
    }
}
