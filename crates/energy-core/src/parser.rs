//! Row validation: turns one [`RawRow`] into a [`MeterReading`] or a
//! [`Rejection`].
//!
//! Checks run in a fixed order (timestamp, value, sign) so a row with several
//! defects always reports the first one.

use crate::models::{MeterReading, RawRow, RejectReason, Rejection};
use crate::time_utils::parse_timestamp;

/// Validate a raw row.
///
/// Pure: the caller is responsible for counting and logging rejects.
pub fn parse_row(row: &RawRow) -> Result<MeterReading, Rejection> {
    let reject = |reason| Rejection {
        building: row.building.clone(),
        row_index: row.row_index,
        reason,
    };

    let timestamp = row
        .timestamp
        .as_deref()
        .and_then(parse_timestamp)
        .ok_or_else(|| reject(RejectReason::MalformedTimestamp))?;

    let kwh = row
        .kwh
        .as_deref()
        .and_then(parse_kwh)
        .ok_or_else(|| reject(RejectReason::MalformedValue))?;

    if kwh < 0.0 {
        return Err(reject(RejectReason::NegativeValue));
    }

    Ok(MeterReading::new(timestamp, kwh, row.building.clone()))
}

/// Parse a kWh field into a finite number. `-0` is normalised to `0`.
fn parse_kwh(s: &str) -> Option<f64> {
    let value: f64 = s.trim().parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    Some(if value == 0.0 { 0.0 } else { value })
}
