//! Tabular CSV exports and the atomic file writer shared by every sink.

use std::path::{Path, PathBuf};

use energy_core::time_utils::format_timestamp;
use energy_core::Result;
use energy_data::manager::BuildingManager;
use serde::Serialize;

/// Column layout of the cleaned-dataset export.
pub const CLEANED_HEADER: [&str; 4] = ["timestamp", "kwh", "building_name", "month"];

/// Column layout of the building summary export.
pub const SUMMARY_HEADER: [&str; 6] = [
    "building",
    "count",
    "total_kwh",
    "mean_kwh",
    "min_kwh",
    "max_kwh",
];

#[derive(Debug, Serialize)]
struct CleanedRecord<'a> {
    timestamp: String,
    kwh: f64,
    building_name: &'a str,
    month: u32,
}

/// Encode the cleaned dataset, one row per valid reading in
/// [`BuildingManager::combined_cleaned_dataset`] order.
pub fn cleaned_dataset_csv(manager: &BuildingManager) -> Result<Vec<u8>> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    wtr.write_record(CLEANED_HEADER)?;
    for reading in manager.combined_cleaned_dataset() {
        wtr.serialize(CleanedRecord {
            timestamp: format_timestamp(&reading.timestamp()),
            kwh: reading.kwh(),
            building_name: reading.building_name(),
            month: reading.month(),
        })?;
    }
    into_bytes(wtr)
}

/// Encode the building summary table. Undefined statistics of a building
/// without readings are empty cells.
pub fn building_summary_csv(manager: &BuildingManager) -> Result<Vec<u8>> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    wtr.write_record(SUMMARY_HEADER)?;
    for row in manager.building_summary_table() {
        wtr.serialize(row)?;
    }
    into_bytes(wtr)
}

fn into_bytes(wtr: csv::Writer<Vec<u8>>) -> Result<Vec<u8>> {
    wtr.into_inner()
        .map_err(|e| energy_core::EnergyError::Io(e.into_error()))
}

/// Write `contents` to `path` through a temp file and a rename, so the final
/// path never holds a partially written file. Creates parent directories.
pub fn write_atomically(path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let tmp = tmp_path(path);
    std::fs::write(&tmp, contents)?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(e.into());
    }
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}
