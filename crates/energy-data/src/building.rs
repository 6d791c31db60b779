use std::cell::OnceCell;
use std::collections::BTreeMap;

use chrono::NaiveDate;
use energy_core::models::MeterReading;
use energy_core::time_utils::IsoWeekKey;
use energy_core::{EnergyError, Result};

use crate::aggregator::{BuildingAggregates, SummaryStats};

/// The readings of one building, in the order they were read from its file.
///
/// Aggregates are computed on first query and cached; appending a reading
/// drops the cache so a later query recomputes from the full set.
#[derive(Debug, Clone)]
pub struct Building {
    name: String,
    readings: Vec<MeterReading>,
    cache: OnceCell<BuildingAggregates>,
}

impl Building {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            readings: Vec::new(),
            cache: OnceCell::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Readings in insertion order.
    pub fn readings(&self) -> &[MeterReading] {
        &self.readings
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    /// Append a reading that belongs to this building.
    ///
    /// Fails with [`EnergyError::BuildingMismatch`] without modifying the
    /// building when the reading carries another building's name.
    pub fn add_reading(&mut self, reading: MeterReading) -> Result<()> {
        if reading.building_name() != self.name {
            return Err(EnergyError::BuildingMismatch {
                expected: self.name.clone(),
                found: reading.building_name().to_string(),
            });
        }
        self.readings.push(reading);
        self.cache.take();
        Ok(())
    }

    fn aggregates(&self) -> &BuildingAggregates {
        self.cache
            .get_or_init(|| BuildingAggregates::compute(&self.readings))
    }

    /// Summed kWh per calendar day.
    pub fn daily_totals(&self) -> &BTreeMap<NaiveDate, f64> {
        &self.aggregates().daily
    }

    /// Summed kWh per ISO week.
    pub fn weekly_totals(&self) -> &BTreeMap<IsoWeekKey, f64> {
        &self.aggregates().weekly
    }

    pub fn summary_stats(&self) -> &SummaryStats {
        &self.aggregates().stats
    }

    pub fn total_consumption(&self) -> f64 {
        self.summary_stats().total
    }

    /// Mean of the weekly totals, `None` without readings.
    pub fn average_weekly_consumption(&self) -> Option<f64> {
        let weekly = self.weekly_totals();
        if weekly.is_empty() {
            return None;
        }
        Some(weekly.values().sum::<f64>() / weekly.len() as f64)
    }

    /// Highest-kWh reading; the earliest one wins a tie.
    pub fn peak_reading(&self) -> Option<&MeterReading> {
        self.readings.iter().reduce(|best, r| {
            let better = r.kwh() > best.kwh()
                || (r.kwh() == best.kwh() && r.timestamp() < best.timestamp());
            if better {
                r
            } else {
                best
            }
        })
    }
}
