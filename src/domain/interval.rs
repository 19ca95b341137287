//! Hourly interval assignment.

use std::fmt;

use chrono::{NaiveDateTime, Timelike};
use serde::{Serialize, Serializer};

/// A half-open one-hour bucket `[HH:00, HH+1:00)`.
///
/// Only the start hour is kept, so records from different days that fall in
/// the same hour share a bucket. Ordering is chronological by start hour.
/// Serializes as its label, e.g. `"09:00 - 10:00"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Interval {
    start_hour: u8,
}

impl Interval {
    /// Creates the interval starting at `hour`. Returns `None` for hours
    /// outside `0..24`.
    #[must_use]
    pub const fn from_hour(hour: u8) -> Option<Self> {
        if hour < 24 {
            Some(Self { start_hour: hour })
        } else {
            None
        }
    }

    /// Start hour (`0..24`).
    #[must_use]
    pub const fn start_hour(&self) -> u8 {
        self.start_hour
    }

    /// End hour; wraps to `0` after `23`.
    #[must_use]
    pub const fn end_hour(&self) -> u8 {
        (self.start_hour + 1) % 24
    }

    /// Canonical `"HH:MM - HH:MM"` label.
    #[must_use]
    pub fn label(&self) -> String {
        self.to_string()
    }

    /// Parses a label produced by [`Interval::label`]. Also accepts a bare
    /// start time such as `"09:00"`.
    #[must_use]
    pub fn parse_label(label: &str) -> Option<Self> {
        let start = label.split('-').next()?.trim();
        let (hour, minute) = start.split_once(':')?;
        if minute.trim() != "00" {
            return None;
        }
        Self::from_hour(hour.trim().parse().ok()?)
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:00 - {:02}:00", self.start_hour, self.end_hour())
    }
}

impl Serialize for Interval {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Maps timestamps onto hourly [`Interval`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntervalAssigner;

impl IntervalAssigner {
    /// Start of the hour containing `ts`.
    #[must_use]
    pub fn floor(ts: NaiveDateTime) -> NaiveDateTime {
        ts.date().and_time(chrono::NaiveTime::MIN) + chrono::Duration::hours(i64::from(ts.hour()))
    }

    /// Interval containing `ts`.
    #[must_use]
    pub fn assign(ts: NaiveDateTime) -> Interval {
        #[allow(clippy::cast_possible_truncation)]
        let hour = ts.hour() as u8;
        Interval { start_hour: hour }
    }

    /// Interval for an optional timestamp; `None` stays `None`.
    #[must_use]
    pub fn assign_opt(ts: Option<NaiveDateTime>) -> Option<Interval> {
        ts.map(Self::assign)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn ts(s: &str) -> NaiveDateTime {
        let Ok(t) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") else {
            panic!("bad test timestamp {s}");
        };
        t
    }

    #[test]
    fn same_hour_same_label() {
        let a = IntervalAssigner::assign(ts("2024-05-01 09:17:00"));
        let b = IntervalAssigner::assign(ts("2024-05-01 09:52:59"));
        assert_eq!(a, b);
        assert_eq!(a.label(), "09:00 - 10:00");
        assert_eq!(a.label().as_bytes(), b.label().as_bytes());
    }

    #[test]
    fn exact_hour_is_left_inclusive() {
        let interval = IntervalAssigner::assign(ts("2024-05-01 10:00:00"));
        assert_eq!(interval.label(), "10:00 - 11:00");
    }

    #[test]
    fn last_hour_wraps_to_midnight() {
        let interval = IntervalAssigner::assign(ts("2024-05-01 23:59:59"));
        assert_eq!(interval.label(), "23:00 - 00:00");
        assert_eq!(interval.end_hour(), 0);
    }

    #[test]
    fn floor_truncates_minutes_and_seconds() {
        let floored = IntervalAssigner::floor(ts("2024-05-01 14:42:13"));
        assert_eq!(floored, ts("2024-05-01 14:00:00"));
    }

    #[test]
    fn ordering_is_chronological() {
        let (Some(a), Some(b)) = (Interval::from_hour(2), Interval::from_hour(13)) else {
            panic!("valid hours");
        };
        assert!(a < b);
        assert!(Interval::from_hour(24).is_none());
    }

    #[test]
    fn parse_label_round_trips() {
        let Some(interval) = Interval::parse_label("09:00 - 10:00") else {
            panic!("label must parse");
        };
        assert_eq!(interval.start_hour(), 9);
        assert_eq!(Interval::parse_label("21:00"), Interval::from_hour(21));
        assert!(Interval::parse_label("9:30 - 10:30").is_none());
        assert!(Interval::parse_label("nonsense").is_none());
    }

    #[test]
    fn null_timestamp_has_no_interval() {
        assert!(IntervalAssigner::assign_opt(None).is_none());
    }

    #[test]
    fn serializes_as_label() {
        let interval = IntervalAssigner::assign(ts("2024-05-01 07:05:00"));
        let Ok(json) = serde_json::to_string(&interval) else {
            panic!("serialization failed");
        };
        assert_eq!(json, "\"07:00 - 08:00\"");
    }
}
