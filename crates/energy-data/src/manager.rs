//! The portfolio: every building of one run plus its ingestion bookkeeping.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use energy_core::models::{MeterReading, RawRow, Rejection};
use energy_core::parser::parse_row;
use energy_core::time_utils::IsoWeekKey;
use energy_core::Result;
use serde::Serialize;
use tracing::{debug, warn};

use crate::aggregator::PeriodTotal;
use crate::building::Building;

// ── Public types ──────────────────────────────────────────────────────────────

/// Outcome of one [`BuildingManager::ingest`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub accepted: usize,
    pub rejected: usize,
}

/// A building source that contributed no readings because it could not be
/// read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnreadableSource {
    pub building: String,
    pub reason: String,
}

/// One row of the building summary table.
///
/// Field order and names are the column layout of the summary export.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuildingSummaryRow {
    pub building: String,
    pub count: usize,
    pub total_kwh: f64,
    pub mean_kwh: Option<f64>,
    pub min_kwh: Option<f64>,
    pub max_kwh: Option<f64>,
}

// ── BuildingManager ───────────────────────────────────────────────────────────

/// Owns all buildings of a run, keyed by unique name.
///
/// Populated during ingestion and only read afterwards. Construct a fresh
/// manager per run.
#[derive(Debug, Default)]
pub struct BuildingManager {
    buildings: BTreeMap<String, Building>,
    rejections: Vec<Rejection>,
    unreadable: Vec<UnreadableSource>,
}

impl BuildingManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_create_building(&mut self, name: &str) -> &mut Building {
        self.buildings
            .entry(name.to_string())
            .or_insert_with(|| Building::new(name))
    }

    /// Ensure a building exists for a source even if it yields no readings.
    pub fn register_building(&mut self, name: &str) {
        self.get_or_create_building(name);
    }

    /// Record a source that could not be read at all. The building exists
    /// with zero readings.
    pub fn record_unreadable(&mut self, name: &str, reason: impl Into<String>) {
        let reason = reason.into();
        warn!("Building '{}' contributes no readings: {}", name, reason);
        self.register_building(name);
        self.unreadable.push(UnreadableSource {
            building: name.to_string(),
            reason,
        });
    }

    /// Validate `rows` and route each valid reading to its building.
    ///
    /// Invalid rows are kept as [`Rejection`]s; none is dropped silently.
    pub fn ingest<I>(&mut self, rows: I) -> Result<IngestReport>
    where
        I: IntoIterator<Item = RawRow>,
    {
        let mut report = IngestReport::default();
        for row in rows {
            match parse_row(&row) {
                Ok(reading) => {
                    let name = reading.building_name().to_string();
                    self.get_or_create_building(&name).add_reading(reading)?;
                    report.accepted += 1;
                }
                Err(rejection) => {
                    debug!("Rejected {}", rejection);
                    self.rejections.push(rejection);
                    report.rejected += 1;
                }
            }
        }
        Ok(report)
    }

    // ── Queries ───────────────────────────────────────────────────────────────

    /// Buildings in name order.
    pub fn buildings(&self) -> impl Iterator<Item = &Building> {
        self.buildings.values()
    }

    pub fn building(&self, name: &str) -> Option<&Building> {
        self.buildings.get(name)
    }

    pub fn building_count(&self) -> usize {
        self.buildings.len()
    }

    pub fn rejections(&self) -> &[Rejection] {
        &self.rejections
    }

    pub fn rejected_count(&self) -> usize {
        self.rejections.len()
    }

    pub fn unreadable_sources(&self) -> &[UnreadableSource] {
        &self.unreadable
    }

    /// Number of valid readings across all buildings.
    pub fn reading_count(&self) -> usize {
        self.buildings.values().map(Building::len).sum()
    }

    /// Every valid reading: buildings in name order, readings in insertion
    /// order within a building.
    pub fn combined_cleaned_dataset(&self) -> Vec<&MeterReading> {
        self.buildings
            .values()
            .flat_map(|b| b.readings().iter())
            .collect()
    }

    /// One summary row per building, ordered by building name.
    pub fn building_summary_table(&self) -> Vec<BuildingSummaryRow> {
        self.buildings
            .values()
            .map(|b| {
                let stats = b.summary_stats();
                BuildingSummaryRow {
                    building: b.name().to_string(),
                    count: stats.count,
                    total_kwh: stats.total,
                    mean_kwh: stats.mean,
                    min_kwh: stats.min,
                    max_kwh: stats.max,
                }
            })
            .collect()
    }

    /// Daily totals of all buildings, ordered by (building, day).
    pub fn cross_building_daily(&self) -> Vec<PeriodTotal<NaiveDate>> {
        self.buildings
            .values()
            .flat_map(|b| {
                b.daily_totals().iter().map(move |(day, kwh)| PeriodTotal {
                    building: b.name().to_string(),
                    period: *day,
                    kwh: *kwh,
                })
            })
            .collect()
    }

    /// Weekly totals of all buildings, ordered by (building, ISO week).
    pub fn cross_building_weekly(&self) -> Vec<PeriodTotal<IsoWeekKey>> {
        self.buildings
            .values()
            .flat_map(|b| {
                b.weekly_totals().iter().map(move |(week, kwh)| PeriodTotal {
                    building: b.name().to_string(),
                    period: *week,
                    kwh: *kwh,
                })
            })
            .collect()
    }

    /// Sum of the building totals, in name order.
    pub fn portfolio_total(&self) -> f64 {
        self.buildings
            .values()
            .map(Building::total_consumption)
            .fold(0.0, |acc, kwh| acc + kwh)
    }

    /// Highest-kWh reading in the portfolio; the first one in cleaned-dataset
    /// order wins a tie.
    pub fn peak_reading(&self) -> Option<&MeterReading> {
        self.combined_cleaned_dataset()
            .into_iter()
            .reduce(|best, r| if r.kwh() > best.kwh() { r } else { best })
    }

    /// Distinct calendar days with at least one reading.
    pub fn days_recorded(&self) -> usize {
        self.buildings
            .values()
            .flat_map(|b| b.daily_totals().keys().copied())
            .collect::<BTreeSet<_>>()
            .len()
    }

    /// Distinct ISO weeks with at least one reading.
    pub fn weeks_recorded(&self) -> usize {
        self.buildings
            .values()
            .flat_map(|b| b.weekly_totals().keys().copied())
            .collect::<BTreeSet<_>>()
            .len()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use energy_core::models::RejectReason;

    fn rows(building: &str, data: &[(&str, &str)]) -> Vec<RawRow> {
        data.iter()
            .enumerate()
            .map(|(i, (ts, kwh))| RawRow::new(building, i + 1, *ts, *kwh))
            .collect()
    }

    fn scenario_manager() -> BuildingManager {
        let mut m = BuildingManager::new();
        m.ingest(rows(
            "building_a",
            &[
                ("2024-01-01T00:00", "10"),
                ("2024-01-01T01:00", "5"),
                ("2024-01-02T00:00", "-3"),
            ],
        ))
        .unwrap();
        m
    }

    #[test]
    fn test_negative_row_scenario() {
        let m = scenario_manager();
        let b = m.building("building_a").unwrap();
        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();

        assert_eq!(m.combined_cleaned_dataset().len(), 2);
        assert_eq!(b.daily_totals()[&day], 15.0);
        assert_eq!(b.total_consumption(), 15.0);
        assert_eq!(m.rejected_count(), 1);
        assert_eq!(m.rejections()[0].reason, RejectReason::NegativeValue);
        assert_eq!(m.rejections()[0].row_index, 3);
    }

    #[test]
    fn test_malformed_value_excluded_others_kept() {
        let mut m = BuildingManager::new();
        let report = m
            .ingest(rows(
                "lab",
                &[
                    ("2024-01-01T00:00", "1.5"),
                    ("2024-01-01T01:00", "n/a"),
                    ("2024-01-01T02:00", "2.5"),
                ],
            ))
            .unwrap();

        assert_eq!(report, IngestReport { accepted: 2, rejected: 1 });
        assert_eq!(m.rejections()[0].reason, RejectReason::MalformedValue);
        assert_eq!(m.building("lab").unwrap().total_consumption(), 4.0);
    }

    #[test]
    fn test_ingest_routes_by_building_name() {
        let mut m = BuildingManager::new();
        let mut input = rows("gym", &[("2024-01-01T00:00", "1")]);
        input.extend(rows("library", &[("2024-01-01T00:00", "2")]));
        input.extend(rows("gym", &[("2024-01-02T00:00", "3")]));
        m.ingest(input).unwrap();

        assert_eq!(m.building_count(), 2);
        assert_eq!(m.building("gym").unwrap().len(), 2);
        assert_eq!(m.building("library").unwrap().len(), 1);
        for b in m.buildings() {
            assert!(b.readings().iter().all(|r| r.building_name() == b.name()));
        }
    }

    #[test]
    fn test_union_of_buildings_is_cleaned_dataset() {
        let mut m = scenario_manager();
        m.ingest(rows("annex", &[("2024-01-03T00:00", "7"), ("bad", "1")]))
            .unwrap();

        let dataset = m.combined_cleaned_dataset();
        assert_eq!(dataset.len(), m.reading_count());
        assert_eq!(dataset.len(), 3);
        // Buildings in name order.
        assert_eq!(dataset[0].building_name(), "annex");
        assert_eq!(dataset[1].building_name(), "building_a");
        assert_eq!(m.rejected_count(), 2);
    }

    #[test]
    fn test_register_and_unreadable_create_empty_buildings() {
        let mut m = BuildingManager::new();
        m.register_building("quiet");
        m.record_unreadable("broken", "permission denied");

        assert_eq!(m.building_count(), 2);
        assert!(m.building("quiet").unwrap().is_empty());
        assert_eq!(m.building("broken").unwrap().summary_stats().count, 0);
        assert_eq!(m.unreadable_sources().len(), 1);
        assert_eq!(m.unreadable_sources()[0].building, "broken");
    }

    #[test]
    fn test_summary_table_sorted_by_name() {
        let mut m = BuildingManager::new();
        m.ingest(rows("zeta", &[("2024-01-01T00:00", "4")])).unwrap();
        m.ingest(rows("alpha", &[("2024-01-01T00:00", "2"), ("2024-01-01T01:00", "6")]))
            .unwrap();
        m.register_building("mid");

        let table = m.building_summary_table();
        let names: Vec<&str> = table.iter().map(|r| r.building.as_str()).collect();
        assert_eq!(names, vec!["alpha", "mid", "zeta"]);
        assert_eq!(table[0].count, 2);
        assert_eq!(table[0].total_kwh, 8.0);
        assert_eq!(table[0].mean_kwh, Some(4.0));
        assert_eq!(table[0].min_kwh, Some(2.0));
        assert_eq!(table[0].max_kwh, Some(6.0));
        assert_eq!(table[1].count, 0);
        assert_eq!(table[1].mean_kwh, None);
    }

    #[test]
    fn test_cross_building_tables() {
        let mut m = BuildingManager::new();
        m.ingest(rows("b", &[("2024-01-02T00:00", "1"), ("2024-01-01T00:00", "2")]))
            .unwrap();
        m.ingest(rows("a", &[("2024-01-10T00:00", "3")])).unwrap();

        let daily = m.cross_building_daily();
        let keys: Vec<(String, String)> = daily
            .iter()
            .map(|p| (p.building.clone(), p.period.to_string()))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("a".to_string(), "2024-01-10".to_string()),
                ("b".to_string(), "2024-01-01".to_string()),
                ("b".to_string(), "2024-01-02".to_string()),
            ]
        );

        let weekly = m.cross_building_weekly();
        assert_eq!(weekly.len(), 2);
        assert_eq!(weekly[0].period, IsoWeekKey { year: 2024, week: 2 });
        assert_eq!(weekly[1].kwh, 3.0);
    }

    #[test]
    fn test_daily_sums_match_building_totals() {
        let mut m = BuildingManager::new();
        m.ingest(rows(
            "a",
            &[
                ("2024-05-01T00:00", "0.1"),
                ("2024-05-01T01:00", "0.2"),
                ("2024-05-02T00:00", "0.3"),
            ],
        ))
        .unwrap();
        for b in m.buildings() {
            let daily_sum: f64 = b.daily_totals().values().sum();
            assert_eq!(daily_sum, b.total_consumption());
            let raw_sum: f64 = b.readings().iter().map(|r| r.kwh()).sum();
            assert!((raw_sum - b.total_consumption()).abs() < 1e-9);
        }
    }

    #[test]
    fn test_portfolio_queries() {
        let mut m = BuildingManager::new();
        m.ingest(rows("a", &[("2024-01-01T00:00", "100"), ("2024-01-08T09:00", "40")]))
            .unwrap();
        m.ingest(rows("b", &[("2024-01-01T05:00", "50"), ("2024-01-01T06:00", "100")]))
            .unwrap();

        assert_eq!(m.portfolio_total(), 290.0);
        assert_eq!(m.days_recorded(), 2);
        assert_eq!(m.weeks_recorded(), 2);

        let peak = m.peak_reading().unwrap();
        assert_eq!(peak.building_name(), "a");
        assert_eq!(peak.kwh(), 100.0);
    }

    #[test]
    fn test_empty_manager() {
        let m = BuildingManager::new();
        assert_eq!(m.portfolio_total(), 0.0);
        assert!(m.portfolio_total().is_sign_positive());
        assert!(m.combined_cleaned_dataset().is_empty());
        assert!(m.building_summary_table().is_empty());
        assert!(m.peak_reading().is_none());
        assert_eq!(m.days_recorded(), 0);
    }
}
