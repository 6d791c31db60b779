use clap::Parser;
use std::path::PathBuf;

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Campus electricity dashboard: cleans per-building meter CSVs and writes
/// aggregate exports, an executive summary and a dashboard image.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "campus-energy",
    about = "Per-building electricity consumption dashboard",
    version
)]
pub struct Settings {
    /// Directory holding one CSV file per building
    #[arg(long, env = "ENERGY_DATA_DIR", default_value = "data")]
    pub data_dir: PathBuf,

    /// Directory receiving the exports, summary and dashboard
    #[arg(long, env = "ENERGY_OUTPUT_DIR", default_value = "output")]
    pub output_dir: PathBuf,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR"])]
    pub log_level: String,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Skip rendering the dashboard image
    #[arg(long)]
    pub no_dashboard: bool,
}

impl Settings {
    /// Parse the process arguments.
    pub fn load() -> Self {
        Self::resolve(Settings::parse())
    }

    /// Same as [`Settings::load`] but accepts an explicit argument list,
    /// enabling unit-testing without spawning subprocesses.
    pub fn from_args<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Settings::try_parse_from(args).map(Self::resolve)
    }

    /// Apply flags that override other fields.
    fn resolve(mut settings: Settings) -> Settings {
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }
        settings
    }

    /// Path of a named artifact inside the output directory.
    pub fn output_path(&self, file_name: &str) -> PathBuf {
        self.output_dir.join(file_name)
    }
}
