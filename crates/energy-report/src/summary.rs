//! Executive summary: a plain-text projection of the portfolio aggregates.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use chrono::NaiveDateTime;
use energy_core::formatting::{format_kwh, format_number, format_optional_kwh, percentage};
use energy_core::models::RejectReason;
use energy_core::time_utils::format_timestamp;
use energy_data::manager::{BuildingManager, BuildingSummaryRow};

/// A building named as highest or lowest consumer.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildingRanking {
    pub building: String,
    pub total_kwh: f64,
}

/// The single largest reading of the portfolio.
#[derive(Debug, Clone, PartialEq)]
pub struct PeakLoad {
    pub building: String,
    pub timestamp: NaiveDateTime,
    pub kwh: f64,
}

/// Everything the executive summary reports, already computed.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutiveSummary {
    pub portfolio_total: f64,
    pub reading_count: usize,
    pub buildings: Vec<BuildingSummaryRow>,
    pub highest: Option<BuildingRanking>,
    pub lowest: Option<BuildingRanking>,
    pub rejected_rows: usize,
    pub rejections_by_reason: BTreeMap<RejectReason, usize>,
    pub unreadable_files: Vec<String>,
    pub peak: Option<PeakLoad>,
    pub days_recorded: usize,
    pub weeks_recorded: usize,
}

impl ExecutiveSummary {
    pub fn from_manager(manager: &BuildingManager) -> Self {
        let buildings = manager.building_summary_table();
        let (highest, lowest) = rank_buildings(&buildings);

        let mut rejections_by_reason = BTreeMap::new();
        for rejection in manager.rejections() {
            *rejections_by_reason.entry(rejection.reason).or_insert(0) += 1;
        }

        Self {
            portfolio_total: manager.portfolio_total(),
            reading_count: manager.reading_count(),
            buildings,
            highest,
            lowest,
            rejected_rows: manager.rejected_count(),
            rejections_by_reason,
            unreadable_files: manager
                .unreadable_sources()
                .iter()
                .map(|s| s.building.clone())
                .collect(),
            peak: manager.peak_reading().map(|r| PeakLoad {
                building: r.building_name().to_string(),
                timestamp: r.timestamp(),
                kwh: r.kwh(),
            }),
            days_recorded: manager.days_recorded(),
            weeks_recorded: manager.weeks_recorded(),
        }
    }

    /// Render the summary as plain text, one trailing newline.
    pub fn render(&self) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = self.write_to(&mut out);
        out
    }

    fn write_to(&self, out: &mut String) -> std::fmt::Result {
        writeln!(out, "Campus Energy Consumption Summary")?;
        writeln!(out, "=================================")?;
        writeln!(
            out,
            "Total Campus Consumption: {}",
            format_kwh(self.portfolio_total)
        )?;
        writeln!(
            out,
            "Buildings: {} | Valid readings: {}",
            self.buildings.len(),
            self.reading_count
        )?;
        writeln!(out)?;

        writeln!(out, "Per-Building Consumption:")?;
        if self.buildings.is_empty() {
            writeln!(out, "  (no buildings)")?;
        }
        for row in &self.buildings {
            writeln!(out, "  {}", row.building)?;
            writeln!(out, "    Readings : {}", row.count)?;
            writeln!(
                out,
                "    Total    : {} ({}% of campus)",
                format_kwh(row.total_kwh),
                format_number(percentage(row.total_kwh, self.portfolio_total, 1), 1)
            )?;
            writeln!(out, "    Mean     : {}", format_optional_kwh(row.mean_kwh))?;
            writeln!(out, "    Min      : {}", format_optional_kwh(row.min_kwh))?;
            writeln!(out, "    Max      : {}", format_optional_kwh(row.max_kwh))?;
        }
        writeln!(out)?;

        writeln!(
            out,
            "Highest Consuming Building: {}",
            describe_ranking(self.highest.as_ref())
        )?;
        writeln!(
            out,
            "Lowest Consuming Building: {}",
            describe_ranking(self.lowest.as_ref())
        )?;
        writeln!(out)?;

        writeln!(out, "Peak Load Details:")?;
        match &self.peak {
            Some(peak) => {
                writeln!(out, "  Building : {}", peak.building)?;
                writeln!(out, "  Time     : {}", format_timestamp(&peak.timestamp))?;
                writeln!(out, "  kWh      : {}", format_number(peak.kwh, 2))?;
            }
            None => writeln!(out, "  none")?,
        }
        writeln!(out)?;

        writeln!(out, "Trends:")?;
        writeln!(out, "  Number of days recorded : {}", self.days_recorded)?;
        writeln!(out, "  Number of weeks recorded: {}", self.weeks_recorded)?;
        writeln!(out)?;

        writeln!(out, "Data Quality:")?;
        writeln!(out, "  Rejected rows    : {}", self.rejected_rows)?;
        for (reason, count) in &self.rejections_by_reason {
            writeln!(out, "    {:<18} : {}", reason.as_str(), count)?;
        }
        writeln!(out, "  Unreadable files : {}", self.unreadable_files.len())?;
        for name in &self.unreadable_files {
            writeln!(out, "    {}", name)?;
        }
        Ok(())
    }
}

/// Pick the highest and lowest consuming buildings among those with
/// readings. `rows` is name-sorted and only a strictly better total replaces
/// the current pick, so ties go to the first name.
fn rank_buildings(
    rows: &[BuildingSummaryRow],
) -> (Option<BuildingRanking>, Option<BuildingRanking>) {
    let mut highest: Option<&BuildingSummaryRow> = None;
    let mut lowest: Option<&BuildingSummaryRow> = None;

    for row in rows.iter().filter(|r| r.count > 0) {
        if highest.map_or(true, |h| row.total_kwh > h.total_kwh) {
            highest = Some(row);
        }
        if lowest.map_or(true, |l| row.total_kwh < l.total_kwh) {
            lowest = Some(row);
        }
    }

    let to_ranking = |r: &BuildingSummaryRow| BuildingRanking {
        building: r.building.clone(),
        total_kwh: r.total_kwh,
    };
    (highest.map(to_ranking), lowest.map(to_ranking))
}

fn describe_ranking(ranking: Option<&BuildingRanking>) -> String {
    match ranking {
        Some(r) => format!("{} ({})", r.building, format_kwh(r.total_kwh)),
        None => "none".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use energy_core::models::RawRow;

    fn manager_with(data: &[(&str, &str, &str)]) -> BuildingManager {
        let mut m = BuildingManager::new();
        let rows = data
            .iter()
            .enumerate()
            .map(|(i, (b, ts, kwh))| RawRow::new(*b, i + 1, *ts, *kwh));
        m.ingest(rows).unwrap();
        m
    }

    #[test]
    fn test_highest_and_lowest() {
        let m = manager_with(&[
            ("A", "2024-01-01T00:00", "60"),
            ("A", "2024-01-02T00:00", "40"),
            ("B", "2024-01-01T00:00", "50"),
        ]);
        let summary = ExecutiveSummary::from_manager(&m);

        assert_eq!(summary.highest.as_ref().unwrap().building, "A");
        assert_eq!(summary.highest.as_ref().unwrap().total_kwh, 100.0);
        assert_eq!(summary.lowest.as_ref().unwrap().building, "B");

        let text = summary.render();
        assert!(text.contains("Highest Consuming Building: A (100.00 kWh)"));
        assert!(text.contains("Lowest Consuming Building: B (50.00 kWh)"));
    }

    #[test]
    fn test_ties_go_to_first_name() {
        let m = manager_with(&[
            ("charlie", "2024-01-01T00:00", "5"),
            ("alpha", "2024-01-01T00:00", "5"),
            ("bravo", "2024-01-01T00:00", "5"),
        ]);
        let summary = ExecutiveSummary::from_manager(&m);
        assert_eq!(summary.highest.unwrap().building, "alpha");
        assert_eq!(summary.lowest.unwrap().building, "alpha");
    }

    #[test]
    fn test_empty_buildings_not_ranked() {
        let mut m = manager_with(&[("busy", "2024-01-01T00:00", "5")]);
        m.register_building("idle");
        let summary = ExecutiveSummary::from_manager(&m);
        assert_eq!(summary.lowest.as_ref().unwrap().building, "busy");
        assert!(summary.render().contains("    Mean     : n/a"));
    }

    #[test]
    fn test_rejected_count_matches_parser_failures() {
        let m = manager_with(&[
            ("a", "2024-01-01T00:00", "10"),
            ("a", "2024-01-01T01:00", "5"),
            ("a", "2024-01-02T00:00", "-3"),
            ("a", "garbage", "1"),
            ("a", "2024-01-03T00:00", "x"),
        ]);
        let summary = ExecutiveSummary::from_manager(&m);
        assert_eq!(summary.rejected_rows, 3);
        assert_eq!(summary.rejections_by_reason[&RejectReason::NegativeValue], 1);
        assert_eq!(summary.rejections_by_reason[&RejectReason::MalformedTimestamp], 1);
        assert_eq!(summary.rejections_by_reason[&RejectReason::MalformedValue], 1);
        assert!(summary.render().contains("  Rejected rows    : 3"));
    }

    #[test]
    fn test_empty_portfolio_renders_zero_totals() {
        let summary = ExecutiveSummary::from_manager(&BuildingManager::new());
        let text = summary.render();
        assert!(text.contains("Total Campus Consumption: 0.00 kWh"));
        assert!(text.contains("Highest Consuming Building: none"));
        assert!(text.contains("Lowest Consuming Building: none"));
        assert!(text.contains("(no buildings)"));
    }

    #[test]
    fn test_peak_and_trends() {
        let m = manager_with(&[
            ("a", "2024-01-01T08:00", "3"),
            ("b", "2024-01-09T18:30", "12.5"),
        ]);
        let text = ExecutiveSummary::from_manager(&m).render();
        assert!(text.contains("  Building : b"));
        assert!(text.contains("  Time     : 2024-01-09 18:30:00"));
        assert!(text.contains("  kWh      : 12.50"));
        assert!(text.contains("Number of days recorded : 2"));
        assert!(text.contains("Number of weeks recorded: 2"));
    }

    #[test]
    fn test_share_of_campus() {
        let m = manager_with(&[
            ("a", "2024-01-01T00:00", "100"),
            ("b", "2024-01-01T00:00", "50"),
        ]);
        let text = ExecutiveSummary::from_manager(&m).render();
        assert!(text.contains("Total    : 100.00 kWh (66.7% of campus)"));
    }
}
