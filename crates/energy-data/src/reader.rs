//! CSV file discovery and loading.
//!
//! Each `*.csv` file directly inside the data directory is one building; the
//! building name is the file stem. Rows are returned unparsed so validation
//! stays in [`energy_core::parser`].

use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use energy_core::models::RawRow;
use energy_core::{EnergyError, Result};
use tracing::{debug, warn};

/// Columns every building file must carry.
pub const REQUIRED_COLUMNS: [&str; 2] = ["timestamp", "kwh"];

/// One building's input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildingSource {
    pub name: String,
    pub path: PathBuf,
}

impl BuildingSource {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            name: building_name(&path),
            path,
        }
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Find the building CSV files directly inside `data_dir`, sorted by path.
///
/// A missing directory is an error; an empty one yields no sources. Files
/// whose stem repeats an earlier one (`a.csv` next to `a.CSV`) are skipped so
/// every building comes from a single file.
pub fn find_building_sources(data_dir: &Path) -> Result<Vec<BuildingSource>> {
    if !data_dir.is_dir() {
        warn!("Data directory does not exist: {}", data_dir.display());
        return Err(EnergyError::DataDirNotFound(data_dir.to_path_buf()));
    }

    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(data_dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file() && is_csv(entry.path()))
        .map(|entry| entry.into_path())
        .collect();

    files.sort();
    debug!("Found {} CSV files in {}", files.len(), data_dir.display());

    let mut seen = HashSet::new();
    let sources = files
        .into_iter()
        .map(BuildingSource::from_path)
        .filter(|source| {
            let first = seen.insert(source.name.clone());
            if !first {
                warn!(
                    "Skipping {}: building '{}' already loaded from another file",
                    source.path.display(),
                    source.name
                );
            }
            first
        })
        .collect();
    Ok(sources)
}

/// Read every data row of a building file.
///
/// Fails when the file cannot be opened or read, or when a required column is
/// absent from the header. Short rows are kept with `None` fields so the
/// parser rejects them.
pub fn read_building_rows(source: &BuildingSource) -> Result<Vec<RawRow>> {
    let file = File::open(&source.path).map_err(|e| EnergyError::FileRead {
        path: source.path.clone(),
        source: e,
    })?;

    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(BufReader::new(file));

    let headers = rdr.byte_headers()?.clone();
    let columns: Vec<String> = headers
        .iter()
        .map(|h| {
            String::from_utf8_lossy(h)
                .trim_start_matches('\u{feff}')
                .trim()
                .to_ascii_lowercase()
        })
        .collect();

    let position = |name: &str| columns.iter().position(|c| c == name);
    let (ts_idx, kwh_idx) = match (position("timestamp"), position("kwh")) {
        (Some(ts), Some(kwh)) => (ts, kwh),
        _ => {
            let missing = REQUIRED_COLUMNS
                .into_iter()
                .filter(|c| position(*c).is_none())
                .map(|c| c.to_string())
                .collect();
            return Err(EnergyError::MissingColumns {
                path: source.path.clone(),
                missing,
            });
        }
    };

    let field = |record: &csv::ByteRecord, idx: usize| {
        record
            .get(idx)
            .map(|f| String::from_utf8_lossy(f).into_owned())
    };

    let mut rows = Vec::new();
    for (i, record) in rdr.byte_records().enumerate() {
        let record = record?;
        rows.push(RawRow {
            building: source.name.clone(),
            row_index: i + 1,
            timestamp: field(&record, ts_idx),
            kwh: field(&record, kwh_idx),
        });
    }

    debug!("File {}: {} rows read", source.path.display(), rows.len());
    Ok(rows)
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn is_csv(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("csv"))
        .unwrap_or(false)
}

/// Building name derived from a file path: its stem, e.g. `building_a`.
pub fn building_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
