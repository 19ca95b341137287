//! Tolerant date-time parsing for terminal exports.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};

const ISO_DATE_TIMES: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

const DAY_FIRST_DATE_TIMES: &[&str] = &[
    "%d/%m/%Y %H:%M:%S%.f",
    "%d/%m/%Y %H:%M",
    "%d-%m-%Y %H:%M:%S%.f",
    "%d-%m-%Y %H:%M",
];

const MONTH_FIRST_DATE_TIMES: &[&str] = &[
    "%m/%d/%Y %H:%M:%S%.f",
    "%m/%d/%Y %H:%M",
    "%m-%d-%Y %H:%M:%S%.f",
    "%m-%d-%Y %H:%M",
];

const DAY_FIRST_DATES: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y"];
const MONTH_FIRST_DATES: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%m-%d-%Y"];

const TIMES: &[&str] = &["%H:%M:%S%.f", "%H:%M"];

/// Parses the date-time layouts seen in terminal exports.
///
/// Offsets in RFC 3339 input are dropped and the local wall time kept.
/// Time-only values land on [`NaiveDate::default`]; only their hour is
/// meaningful downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimestampParser {
    day_first: bool,
}

impl TimestampParser {
    /// Creates a parser. `day_first` selects `dd/mm/yyyy` over `mm/dd/yyyy`.
    #[must_use]
    pub const fn new(day_first: bool) -> Self {
        Self { day_first }
    }

    /// Parses `raw`, returning `None` when no layout matches.
    #[must_use]
    pub fn parse(&self, raw: &str) -> Option<NaiveDateTime> {
        let text = raw.trim();
        if text.is_empty() {
            return None;
        }

        if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
            return Some(dt.naive_local());
        }

        let (date_times, dates) = if self.day_first {
            (DAY_FIRST_DATE_TIMES, DAY_FIRST_DATES)
        } else {
            (MONTH_FIRST_DATE_TIMES, MONTH_FIRST_DATES)
        };

        ISO_DATE_TIMES
            .iter()
            .chain(date_times)
            .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
            .or_else(|| {
                dates
                    .iter()
                    .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
                    .map(|d| d.and_time(NaiveTime::MIN))
            })
            .or_else(|| {
                TIMES
                    .iter()
                    .find_map(|fmt| NaiveTime::parse_from_str(text, fmt).ok())
                    .map(|t| NaiveDate::default().and_time(t))
            })
    }
}

impl Default for TimestampParser {
    fn default() -> Self {
        Self::new(true)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use chrono::{Datelike, Timelike};

    use super::*;

    fn parsed(parser: TimestampParser, raw: &str) -> NaiveDateTime {
        let Some(ts) = parser.parse(raw) else {
            panic!("{raw} should parse");
        };
        ts
    }

    #[test]
    fn iso_layouts() {
        let p = TimestampParser::default();
        let ts = parsed(p, "2024-03-15 21:47:05");
        assert_eq!((ts.hour(), ts.minute(), ts.second()), (21, 47, 5));
        assert_eq!(parsed(p, "2024-03-15T21:47:05.250").hour(), 21);
        assert_eq!(parsed(p, "2024-03-15 08:10").hour(), 8);
    }

    #[test]
    fn rfc3339_keeps_wall_time() {
        let ts = parsed(TimestampParser::default(), "2024-03-15T21:47:05-03:00");
        assert_eq!(ts.hour(), 21);
    }

    #[test]
    fn day_first_brazilian_layout() {
        let ts = parsed(TimestampParser::new(true), "05/03/2024 14:30:00");
        assert_eq!((ts.day(), ts.month()), (5, 3));
        assert_eq!(ts.hour(), 14);
    }

    #[test]
    fn month_first_layout() {
        let ts = parsed(TimestampParser::new(false), "05/03/2024 14:30");
        assert_eq!((ts.day(), ts.month()), (3, 5));
    }

    #[test]
    fn date_only_is_midnight() {
        let ts = parsed(TimestampParser::default(), "15/03/2024");
        assert_eq!((ts.day(), ts.hour()), (15, 0));
    }

    #[test]
    fn time_only_keeps_hour() {
        let ts = parsed(TimestampParser::default(), "09:17:42");
        assert_eq!(ts.hour(), 9);
        assert_eq!(ts.date(), NaiveDate::default());
    }

    #[test]
    fn garbage_is_none() {
        let p = TimestampParser::default();
        assert!(p.parse("").is_none());
        assert!(p.parse("ontem à noite").is_none());
        assert!(p.parse("32/13/2024 10:00").is_none());
    }
}
