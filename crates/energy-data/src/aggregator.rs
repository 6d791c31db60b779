//! Consumption aggregation over daily and ISO-week periods.
//!
//! Every aggregate of a building is derived from one pass over its readings
//! sorted by `(timestamp, kwh)`, so the results do not depend on the order
//! the readings were appended in.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use energy_core::models::MeterReading;
use energy_core::time_utils::IsoWeekKey;

// ── SummaryStats ──────────────────────────────────────────────────────────────

/// Count, total and spread of the readings of one building.
///
/// `mean`, `min` and `max` are `None` when `count == 0`; callers must check
/// `count` (or the options) before using them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SummaryStats {
    pub count: usize,
    pub total: f64,
    pub mean: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl SummaryStats {
    /// Whether this is the zero-reading state.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

// ── PeriodTotal ───────────────────────────────────────────────────────────────

/// One row of a cross-building period table.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodTotal<P> {
    pub building: String,
    pub period: P,
    pub kwh: f64,
}

// ── BuildingAggregates ────────────────────────────────────────────────────────

/// All derived views of a single building's readings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildingAggregates {
    /// Summed kWh per calendar day, ascending.
    pub daily: BTreeMap<NaiveDate, f64>,
    /// Summed kWh per ISO week, ascending.
    pub weekly: BTreeMap<IsoWeekKey, f64>,
    pub stats: SummaryStats,
}

impl BuildingAggregates {
    /// Derive daily, weekly and summary views from `readings`.
    ///
    /// The building total is the sum of the daily totals in date order and
    /// each weekly total is the sum of its daily totals, which keeps the
    /// three views exactly consistent with each other.
    pub fn compute(readings: &[MeterReading]) -> Self {
        let sorted = sorted_readings(readings);

        let daily = aggregate_by_period(sorted.iter().copied(), |r| r.date());
        let weekly = daily
            .iter()
            .fold(BTreeMap::new(), |mut acc: BTreeMap<IsoWeekKey, f64>, (date, kwh)| {
                *acc.entry(IsoWeekKey::of(*date)).or_insert(0.0) += kwh;
                acc
            });

        let count = sorted.len();
        // `Sum` for f64 starts at -0.0; an empty building must report +0.0.
        let total = daily.values().fold(0.0, |acc, kwh| acc + kwh);
        let (min, max) = sorted.iter().fold((None, None), |(lo, hi), r| {
            let kwh = r.kwh();
            (
                Some(lo.map_or(kwh, |m: f64| m.min(kwh))),
                Some(hi.map_or(kwh, |m: f64| m.max(kwh))),
            )
        });
        let mean = if count > 0 {
            Some(total / count as f64)
        } else {
            None
        };

        Self {
            daily,
            weekly,
            stats: SummaryStats {
                count,
                total,
                mean,
                min,
                max,
            },
        }
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Readings ordered by `(timestamp, kwh)`.
pub fn sorted_readings(readings: &[MeterReading]) -> Vec<&MeterReading> {
    let mut sorted: Vec<&MeterReading> = readings.iter().collect();
    sorted.sort_by(|a, b| {
        a.timestamp()
            .cmp(&b.timestamp())
            .then_with(|| a.kwh().total_cmp(&b.kwh()))
    });
    sorted
}

/// Generic aggregation driver.
///
/// `key_fn` maps a reading to its period key; kWh values are summed per key
/// in iteration order.
pub fn aggregate_by_period<'a, K: Ord>(
    readings: impl IntoIterator<Item = &'a MeterReading>,
    key_fn: impl Fn(&MeterReading) -> K,
) -> BTreeMap<K, f64> {
    let mut map: BTreeMap<K, f64> = BTreeMap::new();
    for reading in readings {
        *map.entry(key_fn(reading)).or_insert(0.0) += reading.kwh();
    }
    map
}

// ── Tests ─────────────────────────────────────────────────────────────────────
