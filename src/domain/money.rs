//! Locale-tolerant currency string parsing.
//!
//! Terminal exports mix `"R$1.234,56"` (dot thousands, comma decimal) with
//! `"1234.56"` (dot decimal). A string that carries only a dot is read as
//! a decimal point; `"1.234"` therefore parses as `1.234`.

use std::str::FromStr;

use rust_decimal::Decimal;

/// Outcome of parsing one monetary cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedAmount {
    /// Parsed value, or zero when the cell could not be read.
    pub value: Decimal,
    /// `true` when the cell was coerced to zero.
    pub coerced: bool,
}

impl ParsedAmount {
    const fn ok(value: Decimal) -> Self {
        Self {
            value,
            coerced: false,
        }
    }

    const fn coerced() -> Self {
        Self {
            value: Decimal::ZERO,
            coerced: true,
        }
    }
}

/// Converts currency strings into exact decimals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonetaryParser {
    currency_prefix: String,
}

impl MonetaryParser {
    /// Creates a parser that strips `currency_prefix` (e.g. `"R$"`).
    #[must_use]
    pub fn new(currency_prefix: impl Into<String>) -> Self {
        Self {
            currency_prefix: currency_prefix.into(),
        }
    }

    /// Returns the configured currency prefix.
    #[must_use]
    pub fn currency_prefix(&self) -> &str {
        &self.currency_prefix
    }

    /// Parses a monetary cell. Never fails; unreadable input yields zero
    /// with [`ParsedAmount::coerced`] set.
    #[must_use]
    pub fn parse(&self, raw: &str) -> ParsedAmount {
        let mut text = raw.trim();

        let mut negative = false;
        if let Some(rest) = text.strip_prefix('-') {
            negative = true;
            text = rest.trim_start();
        }
        if !self.currency_prefix.is_empty()
            && let Some(rest) = text.strip_prefix(self.currency_prefix.as_str())
        {
            text = rest.trim_start();
        }
        if !negative && let Some(rest) = text.strip_prefix('-') {
            negative = true;
            text = rest.trim_start();
        }

        if text.is_empty() {
            return ParsedAmount::coerced();
        }

        let normalized = normalize_separators(text);
        match Decimal::from_str(&normalized) {
            Ok(value) if negative => ParsedAmount::ok(-value),
            Ok(value) => ParsedAmount::ok(value),
            Err(_) => ParsedAmount::coerced(),
        }
    }
}

impl Default for MonetaryParser {
    fn default() -> Self {
        Self::new("R$")
    }
}

/// Rewrites thousands/decimal separators into a plain dot-decimal string.
fn normalize_separators(text: &str) -> String {
    let has_dot = text.contains('.');
    let has_comma = text.contains(',');
    if has_dot && has_comma {
        text.replace('.', "").replace(',', ".")
    } else if has_comma {
        text.replace(',', ".")
    } else {
        text.to_string()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        let Ok(d) = Decimal::from_str(s) else {
            panic!("bad test decimal {s}");
        };
        d
    }

    #[test]
    fn parses_brazilian_format_with_prefix() {
        let parser = MonetaryParser::default();
        let parsed = parser.parse("R$1.234,56");
        assert_eq!(parsed.value, dec("1234.56"));
        assert!(!parsed.coerced);
    }

    #[test]
    fn parses_dot_decimal() {
        let parser = MonetaryParser::default();
        assert_eq!(parser.parse("1234.56").value, dec("1234.56"));
    }

    #[test]
    fn parses_comma_decimal() {
        let parser = MonetaryParser::default();
        assert_eq!(parser.parse("1234,56").value, dec("1234.56"));
        assert_eq!(parser.parse(" R$ 0,50 ").value, dec("0.5"));
    }

    #[test]
    fn single_dot_is_a_decimal_point() {
        let parser = MonetaryParser::default();
        assert_eq!(parser.parse("1.234").value, dec("1.234"));
    }

    #[test]
    fn multiple_thousands_groups() {
        let parser = MonetaryParser::default();
        assert_eq!(parser.parse("R$1.234.567,89").value, dec("1234567.89"));
    }

    #[test]
    fn negative_amounts() {
        let parser = MonetaryParser::default();
        assert_eq!(parser.parse("-R$5,00").value, dec("-5"));
        assert_eq!(parser.parse("R$-5,00").value, dec("-5"));
        assert_eq!(parser.parse("-12.5").value, dec("-12.5"));
    }

    #[test]
    fn garbage_is_coerced_to_zero() {
        let parser = MonetaryParser::default();
        let parsed = parser.parse("abc");
        assert_eq!(parsed.value, Decimal::ZERO);
        assert!(parsed.coerced);

        assert!(parser.parse("").coerced);
        assert!(parser.parse("R$").coerced);
        assert!(parser.parse("12,34,56").coerced);
    }

    #[test]
    fn custom_prefix() {
        let parser = MonetaryParser::new("US$");
        assert_eq!(parser.currency_prefix(), "US$");
        assert_eq!(parser.parse("US$10.00").value, dec("10"));
        assert!(parser.parse("R$10,00").coerced);
    }
}
