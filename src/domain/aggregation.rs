//! Grouped sums over ingested records.
//!
//! [`AggregationEngine`] produces three views over the same record slice:
//! per (game, interval), per game, and per player. All views are ordered by
//! their group key so repeated runs over the same input are byte-identical.
//! RTP is always derived from a bucket's summed `wagered`/`won`, never
//! averaged from per-row ratios.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Deserialize;

use super::interval::{Interval, IntervalAssigner};
use super::record::{GameLabel, Record};

/// Return-To-Player of a bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rtp {
    /// `won / wagered * 100`, unrounded.
    Percent(Decimal),
    /// `wagered` summed to zero; the ratio is undefined.
    NotApplicable,
}

impl Rtp {
    /// Computes RTP from summed amounts.
    #[must_use]
    pub fn compute(wagered: Decimal, won: Decimal) -> Self {
        if wagered.is_zero() {
            return Self::NotApplicable;
        }
        won.checked_div(wagered)
            .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
            .map_or(Self::NotApplicable, Self::Percent)
    }

    /// Unrounded percentage, if defined.
    #[must_use]
    pub const fn percent(&self) -> Option<Decimal> {
        match self {
            Self::Percent(p) => Some(*p),
            Self::NotApplicable => None,
        }
    }

    /// Percentage rounded to 2 decimal places for display, if defined.
    #[must_use]
    pub fn rounded(&self) -> Option<Decimal> {
        self.percent().map(|p| p.round_dp(2))
    }
}

impl fmt::Display for Rtp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.rounded() {
            Some(p) => write!(f, "{p}%"),
            None => f.write_str("n/a"),
        }
    }
}

/// Summable fields of a bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Totals {
    /// Rounds played.
    pub round_count: u64,
    /// Money spent.
    pub wagered: Decimal,
    /// Money paid out.
    pub won: Decimal,
    /// Net result as authored.
    pub net_result: Decimal,
}

impl Totals {
    /// Adds one record.
    ///
    /// Sums saturate instead of overflowing. Ingestion rejects files whose
    /// amounts could reach that point (see [`MagnitudeGuard`]).
    pub fn add(&mut self, record: &Record) {
        self.round_count = self.round_count.saturating_add(record.round_count);
        self.wagered = self.wagered.saturating_add(record.wagered);
        self.won = self.won.saturating_add(record.won);
        self.net_result = self.net_result.saturating_add(record.net_result);
    }

    /// Adds another bucket's totals. Saturates like [`Totals::add`].
    pub fn merge(&mut self, other: &Self) {
        self.round_count = self.round_count.saturating_add(other.round_count);
        self.wagered = self.wagered.saturating_add(other.wagered);
        self.won = self.won.saturating_add(other.won);
        self.net_result = self.net_result.saturating_add(other.net_result);
    }

    /// RTP of these totals.
    #[must_use]
    pub fn rtp(&self) -> Rtp {
        Rtp::compute(self.wagered, self.won)
    }

    /// `true` when the house paid out more than it took in.
    #[must_use]
    pub fn is_loss(&self) -> bool {
        is_negative(self.net_result)
    }
}

/// Running sum of absolute amounts over a set of records.
///
/// While every sum fits in a [`Decimal`], any bucket sum over a subset of
/// the same records fits too, so [`Totals`] never saturates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MagnitudeGuard {
    wagered: Decimal,
    won: Decimal,
    net_result: Decimal,
}

impl MagnitudeGuard {
    /// Adds one row's amounts. Returns `None` when a sum would overflow.
    #[must_use]
    pub fn checked_add(&self, wagered: Decimal, won: Decimal, net_result: Decimal) -> Option<Self> {
        Some(Self {
            wagered: self.wagered.checked_add(wagered.abs())?,
            won: self.won.checked_add(won.abs())?,
            net_result: self.net_result.checked_add(net_result.abs())?,
        })
    }

    /// Combines two guards. Returns `None` when a sum would overflow.
    #[must_use]
    pub fn checked_merge(&self, other: &Self) -> Option<Self> {
        self.checked_add(other.wagered, other.won, other.net_result)
    }
}

/// Group key of an aggregation row. Ordering follows field order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GroupKey {
    /// One game during one hourly interval.
    GameInterval {
        /// Game label.
        game: GameLabel,
        /// Hourly interval.
        interval: Interval,
    },
    /// One game over the whole report.
    Game {
        /// Game label.
        game: GameLabel,
    },
    /// One player on one game.
    Player {
        /// Game label.
        game: GameLabel,
        /// Player identifier.
        client_id: String,
        /// Player first name.
        first_name: String,
        /// Player last name.
        last_name: String,
    },
}

impl GroupKey {
    /// Game label of the bucket.
    #[must_use]
    pub const fn game(&self) -> &GameLabel {
        match self {
            Self::GameInterval { game, .. } | Self::Game { game } | Self::Player { game, .. } => {
                game
            }
        }
    }

    /// Interval of the bucket, for interval-keyed views.
    #[must_use]
    pub const fn interval(&self) -> Option<Interval> {
        match self {
            Self::GameInterval { interval, .. } => Some(*interval),
            Self::Game { .. } | Self::Player { .. } => None,
        }
    }
}

/// One grouped result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregationRow {
    /// Group key.
    pub key: GroupKey,
    /// Summed fields.
    pub totals: Totals,
}

impl AggregationRow {
    /// RTP derived from this row's sums.
    #[must_use]
    pub fn rtp(&self) -> Rtp {
        self.totals.rtp()
    }
}

/// Row filter for the per-player view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerScope {
    /// Restrict to one game.
    pub game: Option<GameLabel>,
    /// Restrict to one interval; rows without timestamp are then excluded.
    pub interval: Option<Interval>,
    /// Keep only rows whose own `net_result` is negative.
    pub losing_rows_only: bool,
}

impl PlayerScope {
    fn admits(&self, record: &Record) -> bool {
        if let Some(game) = &self.game
            && &record.game != game
        {
            return false;
        }
        if let Some(interval) = self.interval
            && IntervalAssigner::assign_opt(record.timestamp) != Some(interval)
        {
            return false;
        }
        if self.losing_rows_only && !is_negative(record.net_result) {
            return false;
        }
        true
    }
}

/// Which bucket granularity a loss listing uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LossView {
    /// (game, interval) buckets.
    #[default]
    Intervals,
    /// Whole-day buckets per game.
    Daily,
}

impl FromStr for LossView {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "intervals" | "interval" => Ok(Self::Intervals),
            "daily" | "day" => Ok(Self::Daily),
            other => Err(format!("unknown loss view: {other}")),
        }
    }
}

/// A loss-making bucket with the players who lost the house money in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LossBucket {
    /// The loss-making bucket.
    pub bucket: AggregationRow,
    /// Per-player sums over the bucket's losing rows.
    pub contributors: Vec<AggregationRow>,
}

/// Computes grouped views over one report run's records.
#[derive(Debug, Clone, Copy)]
pub struct AggregationEngine<'a> {
    records: &'a [Record],
}

impl<'a> AggregationEngine<'a> {
    /// Wraps the concatenated records of a report run.
    #[must_use]
    pub const fn new(records: &'a [Record]) -> Self {
        Self { records }
    }

    /// Sums per (game, interval). Rows without a timestamp are excluded.
    #[must_use]
    pub fn by_game_interval(&self) -> Vec<AggregationRow> {
        group(self.records.iter().filter_map(|r| {
            IntervalAssigner::assign_opt(r.timestamp).map(|interval| {
                (
                    GroupKey::GameInterval {
                        game: r.game.clone(),
                        interval,
                    },
                    r,
                )
            })
        }))
    }

    /// Sums per game across all intervals.
    #[must_use]
    pub fn by_game(&self) -> Vec<AggregationRow> {
        group(
            self.records
                .iter()
                .map(|r| (GroupKey::Game { game: r.game.clone() }, r)),
        )
    }

    /// Sums per (game, player) over the rows admitted by `scope`.
    #[must_use]
    pub fn by_player(&self, scope: &PlayerScope) -> Vec<AggregationRow> {
        group(self.records.iter().filter(|r| scope.admits(r)).map(|r| {
            (
                GroupKey::Player {
                    game: r.game.clone(),
                    client_id: r.client_id.clone(),
                    first_name: r.first_name.clone(),
                    last_name: r.last_name.clone(),
                },
                r,
            )
        }))
    }

    /// Sums over every record.
    #[must_use]
    pub fn grand_total(&self) -> Totals {
        let mut totals = Totals::default();
        for record in self.records {
            totals.add(record);
        }
        totals
    }

    /// Loss-making buckets of `view`, most negative first, each with its
    /// contributing players (losing rows only).
    #[must_use]
    pub fn loss_buckets(&self, view: LossView) -> Vec<LossBucket> {
        let rows = match view {
            LossView::Intervals => self.by_game_interval(),
            LossView::Daily => self.by_game(),
        };
        losses(&rows)
            .into_iter()
            .map(|bucket| {
                let scope = PlayerScope {
                    game: Some(bucket.key.game().clone()),
                    interval: bucket.key.interval(),
                    losing_rows_only: true,
                };
                let contributors = self.by_player(&scope);
                LossBucket {
                    bucket,
                    contributors,
                }
            })
            .collect()
    }
}

/// Keeps loss-making rows, sorted ascending by `net_result`.
///
/// The sort is stable: equal losses keep their order in `rows`.
#[must_use]
pub fn losses(rows: &[AggregationRow]) -> Vec<AggregationRow> {
    let mut out: Vec<AggregationRow> = rows.iter().filter(|r| r.totals.is_loss()).cloned().collect();
    out.sort_by(|a, b| a.totals.net_result.cmp(&b.totals.net_result));
    out
}

fn is_negative(value: Decimal) -> bool {
    value.is_sign_negative() && !value.is_zero()
}

fn group<'r, I>(items: I) -> Vec<AggregationRow>
where
    I: Iterator<Item = (GroupKey, &'r Record)>,
{
    let mut buckets: BTreeMap<GroupKey, Totals> = BTreeMap::new();
    for (key, record) in items {
        buckets.entry(key).or_default().add(record);
    }
    buckets
        .into_iter()
        .map(|(key, totals)| AggregationRow { key, totals })
        .collect()
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use chrono::NaiveDateTime;

    use super::*;

    fn dec(s: &str) -> Decimal {
        let Ok(d) = Decimal::from_str(s) else {
            panic!("bad test decimal {s}");
        };
        d
    }

    fn game(name: &str) -> GameLabel {
        let Some(label) = GameLabel::new(name) else {
            panic!("valid label");
        };
        label
    }

    fn record(g: &str, client: &str, at: Option<&str>, wagered: &str, won: &str, net: &str) -> Record {
        let timestamp = at.map(|s| {
            let Ok(ts) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") else {
                panic!("bad test timestamp {s}");
            };
            ts
        });
        Record {
            client_id: client.to_string(),
            first_name: format!("First{client}"),
            last_name: format!("Last{client}"),
            timestamp,
            round_count: 1,
            wagered: dec(wagered),
            won: dec(won),
            net_result: dec(net),
            game: game(g),
        }
    }

    fn row_with_net(g: &str, net: &str) -> AggregationRow {
        AggregationRow {
            key: GroupKey::Game { game: game(g) },
            totals: Totals {
                net_result: dec(net),
                ..Totals::default()
            },
        }
    }

    fn sample() -> Vec<Record> {
        vec![
            record("Roleta", "1", Some("2024-05-01 09:17:00"), "100", "150", "-50"),
            record("Roleta", "2", Some("2024-05-01 09:52:00"), "200", "100", "100"),
            record("Roleta", "1", Some("2024-05-01 10:00:00"), "50", "0", "50"),
            record("Slots", "3", Some("2024-05-01 09:05:00"), "10", "40", "-30"),
            record("Slots", "3", None, "20", "0", "20"),
        ]
    }

    #[test]
    fn rtp_from_sums() {
        assert_eq!(Rtp::compute(dec("1000"), dec("950")).percent(), Some(dec("95")));
        assert_eq!(Rtp::compute(dec("3"), dec("1")).rounded(), Some(dec("33.33")));
    }

    #[test]
    fn rtp_zero_wagered_is_not_applicable() {
        let rtp = Rtp::compute(Decimal::ZERO, Decimal::ZERO);
        assert_eq!(rtp, Rtp::NotApplicable);
        assert_eq!(rtp.rounded(), None);
        assert_eq!(rtp.to_string(), "n/a");
    }

    #[test]
    fn rtp_is_not_an_average_of_row_ratios() {
        let records = vec![
            record("Roleta", "1", None, "1000", "500", "500"),
            record("Roleta", "2", None, "10", "20", "-10"),
        ];
        let rows = AggregationEngine::new(&records).by_game();
        let Some(row) = rows.first() else {
            panic!("missing row");
        };
        // 520 / 1010, not (50% + 200%) / 2
        assert_eq!(row.rtp().rounded(), Some(dec("51.49")));
    }

    #[test]
    fn game_interval_view_groups_by_hour() {
        let records = sample();
        let rows = AggregationEngine::new(&records).by_game_interval();
        let keys: Vec<(String, String)> = rows
            .iter()
            .filter_map(|r| {
                r.key
                    .interval()
                    .map(|i| (r.key.game().to_string(), i.label()))
            })
            .collect();
        assert_eq!(
            keys,
            vec![
                ("Roleta".to_string(), "09:00 - 10:00".to_string()),
                ("Roleta".to_string(), "10:00 - 11:00".to_string()),
                ("Slots".to_string(), "09:00 - 10:00".to_string()),
            ]
        );
        let Some(first) = rows.first() else {
            panic!("missing row");
        };
        assert_eq!(first.totals.wagered, dec("300"));
        assert_eq!(first.totals.net_result, dec("50"));
        assert_eq!(first.totals.round_count, 2);
    }

    #[test]
    fn null_timestamps_only_leave_interval_view() {
        let records = sample();
        let engine = AggregationEngine::new(&records);
        let interval_net: Decimal = engine.by_game_interval().iter().map(|r| r.totals.net_result).sum();
        let game_net: Decimal = engine.by_game().iter().map(|r| r.totals.net_result).sum();
        assert_eq!(interval_net, dec("70"));
        assert_eq!(game_net, dec("90"));
        assert_eq!(engine.grand_total().net_result, game_net);
    }

    #[test]
    fn views_agree_when_all_rows_are_timed() {
        let records: Vec<Record> = sample().into_iter().filter(|r| r.timestamp.is_some()).collect();
        let engine = AggregationEngine::new(&records);
        let interval_net: Decimal = engine.by_game_interval().iter().map(|r| r.totals.net_result).sum();
        let game_net: Decimal = engine.by_game().iter().map(|r| r.totals.net_result).sum();
        let player_net: Decimal = engine
            .by_player(&PlayerScope::default())
            .iter()
            .map(|r| r.totals.net_result)
            .sum();
        let direct: Decimal = records.iter().map(|r| r.net_result).sum();
        assert_eq!(interval_net, direct);
        assert_eq!(game_net, direct);
        assert_eq!(player_net, direct);
    }

    #[test]
    fn loss_sort_is_ascending_and_drops_gains() {
        let rows = vec![
            row_with_net("A", "-50"),
            row_with_net("B", "-200"),
            row_with_net("C", "10"),
            row_with_net("D", "-5"),
        ];
        let nets: Vec<Decimal> = losses(&rows).iter().map(|r| r.totals.net_result).collect();
        assert_eq!(nets, vec![dec("-200"), dec("-50"), dec("-5")]);
    }

    #[test]
    fn loss_sort_ties_keep_input_order() {
        let rows = vec![
            row_with_net("Z", "-10"),
            row_with_net("A", "-10"),
            row_with_net("M", "-30"),
        ];
        let games: Vec<String> = losses(&rows).iter().map(|r| r.key.game().to_string()).collect();
        assert_eq!(games, vec!["M", "Z", "A"]);
    }

    #[test]
    fn zero_net_is_not_a_loss() {
        assert!(losses(&[row_with_net("A", "0"), row_with_net("B", "-0")]).is_empty());
    }

    #[test]
    fn player_scope_filters() {
        let records = sample();
        let engine = AggregationEngine::new(&records);

        let all = engine.by_player(&PlayerScope::default());
        assert_eq!(all.len(), 3);

        let scope = PlayerScope {
            game: Some(game("Roleta")),
            interval: Interval::from_hour(9),
            losing_rows_only: true,
        };
        let scoped = engine.by_player(&scope);
        assert_eq!(scoped.len(), 1);
        let Some(row) = scoped.first() else {
            panic!("missing row");
        };
        let GroupKey::Player { client_id, first_name, .. } = &row.key else {
            panic!("expected player key");
        };
        assert_eq!(client_id, "1");
        assert_eq!(first_name, "First1");
        assert_eq!(row.totals.net_result, dec("-50"));
    }

    #[test]
    fn loss_buckets_carry_contributors() {
        let records = sample();
        let engine = AggregationEngine::new(&records);

        let intervals = engine.loss_buckets(LossView::Intervals);
        let summary: Vec<(String, Decimal, usize)> = intervals
            .iter()
            .map(|b| {
                (
                    b.bucket.key.game().to_string(),
                    b.bucket.totals.net_result,
                    b.contributors.len(),
                )
            })
            .collect();
        assert_eq!(summary, vec![("Slots".to_string(), dec("-30"), 1)]);

        // Daily: Roleta nets +100, Slots nets -10.
        let daily = engine.loss_buckets(LossView::Daily);
        assert_eq!(daily.len(), 1);
        let Some(bucket) = daily.first() else {
            panic!("missing bucket");
        };
        assert_eq!(bucket.bucket.totals.net_result, dec("-10"));
        assert_eq!(bucket.contributors.len(), 1);
    }

    #[test]
    fn aggregation_is_associative_over_concatenation() {
        let all = sample();
        let (left, right) = all.split_at(2);
        let whole = AggregationEngine::new(&all).by_game();

        let mut merged: BTreeMap<GroupKey, Totals> = BTreeMap::new();
        for part in [left, right] {
            for row in AggregationEngine::new(part).by_game() {
                merged.entry(row.key).or_default().merge(&row.totals);
            }
        }
        let merged: Vec<AggregationRow> = merged
            .into_iter()
            .map(|(key, totals)| AggregationRow { key, totals })
            .collect();
        assert_eq!(whole, merged);
    }

    #[test]
    fn loss_view_parsing() {
        assert_eq!("intervals".parse(), Ok(LossView::Intervals));
        assert_eq!("Daily".parse(), Ok(LossView::Daily));
        assert!("weekly".parse::<LossView>().is_err());
    }

    #[test]
    fn totals_saturate_instead_of_overflowing() {
        let huge = record("Roleta", "1", None, "79228162514264337593543950335", "0", "0");
        let mut totals = Totals::default();
        totals.add(&huge);
        totals.add(&huge);
        assert_eq!(totals.wagered, Decimal::MAX);

        let mut merged = totals;
        merged.merge(&totals);
        assert_eq!(merged.wagered, Decimal::MAX);
    }

    #[test]
    fn magnitude_guard_catches_overflow_regardless_of_sign() {
        let max = Decimal::MAX;
        let Some(one) = MagnitudeGuard::default().checked_add(max, Decimal::ZERO, Decimal::ZERO) else {
            panic!("a single max amount fits");
        };
        assert!(one.checked_add(Decimal::ONE, Decimal::ZERO, Decimal::ZERO).is_none());
        assert!(one.checked_merge(&one).is_none());

        let Some(net) = MagnitudeGuard::default().checked_add(Decimal::ZERO, Decimal::ZERO, max) else {
            panic!("a single max amount fits");
        };
        assert!(net.checked_add(Decimal::ZERO, Decimal::ZERO, -max).is_none());
    }
}
