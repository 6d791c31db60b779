mod bootstrap;

use std::path::PathBuf;

use anyhow::{Context, Result};
use energy_core::settings::Settings;
use energy_data::manager::BuildingManager;
use energy_data::pipeline::load_portfolio;
use energy_report::dashboard::{render_dashboard, DashboardData};
use energy_report::export::{building_summary_csv, cleaned_dataset_csv, write_atomically};
use energy_report::summary::ExecutiveSummary;

const CLEANED_FILE: &str = "cleaned_energy_data.csv";
const SUMMARY_TABLE_FILE: &str = "building_summary.csv";
const SUMMARY_TEXT_FILE: &str = "summary.txt";
const DASHBOARD_FILE: &str = "dashboard.svg";

/// Files produced by one run.
#[derive(Debug, Default)]
struct RunOutputs {
    written: Vec<PathBuf>,
    summary_text: String,
}

fn main() -> Result<()> {
    let settings = Settings::load();

    bootstrap::setup_logging(&settings.log_level)?;

    tracing::info!("Campus energy dashboard v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Data dir: {}, Output dir: {}",
        settings.data_dir.display(),
        settings.output_dir.display()
    );

    let outputs = run(&settings)?;

    println!("\n------ EXECUTIVE SUMMARY ------");
    print!("{}", outputs.summary_text);
    println!("------ END OF SUMMARY ------\n");

    tracing::info!("All outputs written ({} files)", outputs.written.len());
    Ok(())
}

/// Load, aggregate and write every output for `settings`.
fn run(settings: &Settings) -> Result<RunOutputs> {
    let manager = load_portfolio(&settings.data_dir).with_context(|| {
        format!(
            "cannot load building data from {}",
            settings.data_dir.display()
        )
    })?;

    if manager.reading_count() == 0 {
        tracing::warn!("No valid readings found; writing zero-total outputs");
    }

    write_outputs(&manager, settings)
}

/// Encode every artifact in memory, then write them out.
fn write_outputs(manager: &BuildingManager, settings: &Settings) -> Result<RunOutputs> {
    let cleaned = cleaned_dataset_csv(manager)?;
    let summary_table = building_summary_csv(manager)?;
    let summary_text = ExecutiveSummary::from_manager(manager).render();

    bootstrap::ensure_output_dir(&settings.output_dir)?;

    let mut outputs = RunOutputs {
        summary_text,
        ..RunOutputs::default()
    };

    let files: [(&str, &[u8]); 3] = [
        (CLEANED_FILE, &cleaned),
        (SUMMARY_TABLE_FILE, &summary_table),
        (SUMMARY_TEXT_FILE, outputs.summary_text.as_bytes()),
    ];
    for (name, contents) in files {
        let path = settings.output_path(name);
        write_atomically(&path, contents)
            .with_context(|| format!("cannot write {}", path.display()))?;
        tracing::info!("Saved {}", path.display());
        outputs.written.push(path);
    }

    if settings.no_dashboard {
        tracing::info!("Dashboard rendering disabled");
    } else {
        let path = settings.output_path(DASHBOARD_FILE);
        match render_dashboard(&path, &DashboardData::from_manager(manager)) {
            Ok(true) => {
                tracing::info!("Dashboard saved as {}", path.display());
                outputs.written.push(path);
            }
            Ok(false) => {}
            Err(e) => tracing::warn!("Dashboard not written to {}: {}", path.display(), e),
        }
    }

    Ok(outputs)
}
