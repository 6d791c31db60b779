use std::fmt;

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// One validated electricity-meter measurement.
///
/// Only [`crate::parser::parse_row`] constructs readings, so every instance
/// carries a parsed timestamp and a finite, non-negative `kwh`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeterReading {
    timestamp: NaiveDateTime,
    kwh: f64,
    building_name: String,
    month: u32,
}

impl MeterReading {
    pub(crate) fn new(timestamp: NaiveDateTime, kwh: f64, building_name: String) -> Self {
        Self {
            month: timestamp.month(),
            timestamp,
            kwh,
            building_name,
        }
    }

    /// Wall-clock time of the measurement.
    pub fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }

    /// Calendar day of the measurement.
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }

    pub fn kwh(&self) -> f64 {
        self.kwh
    }

    /// Name of the building whose source produced this reading.
    pub fn building_name(&self) -> &str {
        &self.building_name
    }

    /// Month of the timestamp, 1-12.
    pub fn month(&self) -> u32 {
        self.month
    }
}

/// One unparsed CSV row, tagged with the building it came from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow {
    /// Building name taken from the source file.
    pub building: String,
    /// 1-based data-row position within the source file (header excluded).
    pub row_index: usize,
    /// Raw `timestamp` field; `None` when the row is too short to have one.
    pub timestamp: Option<String>,
    /// Raw `kwh` field; `None` when the row is too short to have one.
    pub kwh: Option<String>,
}

impl RawRow {
    pub fn new(
        building: impl Into<String>,
        row_index: usize,
        timestamp: impl Into<String>,
        kwh: impl Into<String>,
    ) -> Self {
        Self {
            building: building.into(),
            row_index,
            timestamp: Some(timestamp.into()),
            kwh: Some(kwh.into()),
        }
    }
}

/// Why a raw row was excluded from every aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RejectReason {
    /// Missing, empty or unparsable timestamp.
    MalformedTimestamp,
    /// Missing, empty, non-numeric or non-finite kWh value.
    MalformedValue,
    /// kWh value below zero.
    NegativeValue,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::MalformedTimestamp => "MalformedTimestamp",
            RejectReason::MalformedValue => "MalformedValue",
            RejectReason::NegativeValue => "NegativeValue",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A raw row that failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rejection {
    pub building: String,
    pub row_index: usize,
    pub reason: RejectReason,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} row {}: {}", self.building, self.row_index, self.reason)
    }
}
