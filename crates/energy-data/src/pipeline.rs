//! Ingestion pipeline: data directory → [`BuildingManager`].

use std::path::Path;

use energy_core::Result;
use tracing::{debug, info};

use crate::manager::BuildingManager;
use crate::reader::{find_building_sources, read_building_rows, BuildingSource};

/// Load every building file in `data_dir` into a fresh [`BuildingManager`].
///
/// 1. Discover the building sources (a missing directory is the only fatal
///    condition).
/// 2. Register one building per source, so files with no valid rows still
///    appear with zero readings.
/// 3. Read and ingest each file; a file that cannot be read is recorded as
///    unreadable and processing moves on to the next one.
pub fn load_portfolio(data_dir: &Path) -> Result<BuildingManager> {
    let sources = find_building_sources(data_dir)?;
    let mut manager = BuildingManager::new();

    for source in &sources {
        ingest_source(&mut manager, source)?;
    }

    info!(
        "Loaded {} buildings: {} readings accepted, {} rows rejected, {} files unreadable",
        manager.building_count(),
        manager.reading_count(),
        manager.rejected_count(),
        manager.unreadable_sources().len(),
    );

    Ok(manager)
}

/// Ingest a single building source into `manager`.
///
/// Building-level failures are recorded on the manager; any other error is
/// returned.
pub fn ingest_source(manager: &mut BuildingManager, source: &BuildingSource) -> Result<()> {
    info!("Reading file: {}", source.path.display());
    manager.register_building(&source.name);

    match read_building_rows(source) {
        Ok(rows) => {
            let report = manager.ingest(rows)?;
            debug!(
                "Building {}: {} accepted, {} rejected",
                source.name, report.accepted, report.rejected
            );
            Ok(())
        }
        Err(e) if e.is_building_level() => {
            manager.record_unreadable(&source.name, e.to_string());
            Ok(())
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use energy_core::EnergyError;
    use tempfile::TempDir;

    #[test]
    fn test_missing_data_dir_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let err = load_portfolio(&tmp.path().join("absent")).unwrap_err();
        assert!(matches!(err, EnergyError::DataDirNotFound(_)));
    }

    #[test]
    fn test_empty_data_dir() {
        let tmp = TempDir::new().unwrap();
        let manager = load_portfolio(tmp.path()).unwrap();
        assert_eq!(manager.building_count(), 0);
        assert_eq!(manager.portfolio_total(), 0.0);
    }

    #[test]
    fn test_loads_buildings_and_counts_rejects() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(
            tmp.path().join("building_a.csv"),
            "timestamp,kwh\n2024-01-01T00:00,10\n2024-01-01T01:00,5\n2024-01-02T00:00,-3\n",
        )
        .unwrap();
        std::fs::write(
            tmp.path().join("building_b.csv"),
            "timestamp,kwh\n2024-01-01T00:00,abc\n2024-01-01T01:00,2\n",
        )
        .unwrap();

        let manager = load_portfolio(tmp.path()).unwrap();
        assert_eq!(manager.building_count(), 2);
        assert_eq!(manager.building("building_a").unwrap().total_consumption(), 15.0);
        assert_eq!(manager.building("building_b").unwrap().total_consumption(), 2.0);
        assert_eq!(manager.rejected_count(), 2);
    }

    #[test]
    fn test_bad_file_does_not_abort_others() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("broken.csv"), "when,energy\n2024-01-01,1\n").unwrap();
        std::fs::write(
            tmp.path().join("good.csv"),
            "timestamp,kwh\n2024-01-01T00:00,4\n",
        )
        .unwrap();

        let manager = load_portfolio(tmp.path()).unwrap();
        assert_eq!(manager.building_count(), 2);
        assert!(manager.building("broken").unwrap().is_empty());
        assert_eq!(manager.unreadable_sources().len(), 1);
        assert_eq!(manager.building("good").unwrap().len(), 1);
    }

    #[test]
    fn test_file_with_only_invalid_rows_yields_empty_building() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("noisy.csv"), "timestamp,kwh\nx,1\n2024-01-01,-1\n")
            .unwrap();

        let manager = load_portfolio(tmp.path()).unwrap();
        assert!(manager.building("noisy").unwrap().is_empty());
        assert!(manager.unreadable_sources().is_empty());
        assert_eq!(manager.rejected_count(), 2);
    }
}
