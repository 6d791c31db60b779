use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the campus energy pipeline.
#[derive(Error, Debug)]
pub enum EnergyError {
    /// A building file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A building file is readable but lacks one or more required columns.
    #[error("Missing required columns in {path}: {}", .missing.join(", "))]
    MissingColumns { path: PathBuf, missing: Vec<String> },

    /// The configured input directory does not exist.
    #[error("Data directory not found: {0}")]
    DataDirNotFound(PathBuf),

    /// A reading was handed to a building it does not belong to.
    #[error("Reading for building '{found}' cannot be added to building '{expected}'")]
    BuildingMismatch { expected: String, found: String },

    /// CSV encoding or decoding failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The dashboard image could not be drawn.
    #[error("Render error: {0}")]
    Render(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl EnergyError {
    /// Whether this error only disqualifies a single building source.
    ///
    /// Building-level failures leave the building with zero readings and the
    /// run continues; everything else aborts the run.
    pub fn is_building_level(&self) -> bool {
        matches!(
            self,
            EnergyError::FileRead { .. } | EnergyError::MissingColumns { .. } | EnergyError::Csv(_)
        )
    }
}

/// Convenience alias used throughout the energy crates.
pub type Result<T> = std::result::Result<T, EnergyError>;
