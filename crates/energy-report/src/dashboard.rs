//! Three-panel SVG dashboard: daily trend lines, average weekly consumption
//! bars and an hour-of-day scatter of every reading.

use std::path::Path;

use chrono::{Days, NaiveDate};
use energy_core::time_utils::hour_of_day;
use energy_core::{EnergyError, Result};
use energy_data::manager::BuildingManager;
use plotters::coord::Shift;
use plotters::prelude::*;
use tracing::warn;

use crate::export::write_atomically;

const SIZE: (u32, u32) = (1000, 1500);

// ── DashboardData ─────────────────────────────────────────────────────────────

/// Daily totals of one building, in date order.
#[derive(Debug, Clone, PartialEq)]
pub struct DailySeries {
    pub building: String,
    pub points: Vec<(NaiveDate, f64)>,
}

/// The finished tables the dashboard plots. Buildings without readings are
/// left out.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardData {
    pub daily: Vec<DailySeries>,
    /// Mean of each building's weekly totals, in name order.
    pub weekly_average: Vec<(String, f64)>,
    /// `(hour of day, kWh)` for every valid reading.
    pub hourly_points: Vec<(u32, f64)>,
}

impl DashboardData {
    pub fn from_manager(manager: &BuildingManager) -> Self {
        let daily = manager
            .buildings()
            .filter(|b| !b.is_empty())
            .map(|b| DailySeries {
                building: b.name().to_string(),
                points: b.daily_totals().iter().map(|(d, kwh)| (*d, *kwh)).collect(),
            })
            .collect();

        let weekly_average = manager
            .buildings()
            .filter_map(|b| {
                b.average_weekly_consumption()
                    .map(|avg| (b.name().to_string(), avg))
            })
            .collect();

        let hourly_points = manager
            .combined_cleaned_dataset()
            .into_iter()
            .map(|r| (hour_of_day(&r.timestamp()), r.kwh()))
            .collect();

        Self {
            daily,
            weekly_average,
            hourly_points,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.hourly_points.is_empty()
    }

    fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let dates = self.daily.iter().flat_map(|s| s.points.iter().map(|(d, _)| *d));
        let first = dates.clone().min()?;
        let last = dates.max()?;
        Some((first, last))
    }
}

// ── Rendering ─────────────────────────────────────────────────────────────────

/// Render the dashboard to an SVG file at `path`.
///
/// Returns `Ok(false)` without touching the file system when there is nothing
/// to plot.
pub fn render_dashboard(path: &Path, data: &DashboardData) -> Result<bool> {
    if data.is_empty() {
        warn!("No data available for plotting; dashboard skipped");
        return Ok(false);
    }

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, SIZE).into_drawing_area();
        root.fill(&WHITE).map_err(render_err)?;
        let root = root
            .titled("Campus Energy-Use Dashboard", ("sans-serif", 32))
            .map_err(render_err)?;

        let panels = root.split_evenly((3, 1));
        draw_daily_trend(&panels[0], data)?;
        draw_weekly_average(&panels[1], data)?;
        draw_hourly_scatter(&panels[2], data)?;

        root.present().map_err(render_err)?;
    }

    write_atomically(path, svg.as_bytes())?;
    Ok(true)
}

fn render_err<E: std::fmt::Display>(e: E) -> EnergyError {
    EnergyError::Render(e.to_string())
}

/// Upper bound for a kWh axis with some headroom.
fn y_upper(max: f64) -> f64 {
    if max > 0.0 {
        max * 1.1
    } else {
        1.0
    }
}

fn draw_daily_trend<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    data: &DashboardData,
) -> Result<()> {
    let Some((first, last)) = data.date_range() else {
        return Ok(());
    };
    let span = (last - first).num_days();
    let y_max = data
        .daily
        .iter()
        .flat_map(|s| s.points.iter().map(|(_, kwh)| *kwh))
        .fold(0.0, f64::max);

    let mut chart = ChartBuilder::on(area)
        .caption("Daily Electricity Consumption", ("sans-serif", 22))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(70)
        .build_cartesian_2d(0i64..span + 1, 0f64..y_upper(y_max))
        .map_err(render_err)?;

    let label_date = |offset: &i64| {
        u64::try_from(*offset)
            .ok()
            .and_then(|n| first.checked_add_days(Days::new(n)))
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default()
    };
    chart
        .configure_mesh()
        .x_desc("Date")
        .y_desc("kWh")
        .x_label_formatter(&label_date)
        .draw()
        .map_err(render_err)?;

    for (idx, series) in data.daily.iter().enumerate() {
        let color = Palette99::pick(idx).to_rgba();
        let points: Vec<(i64, f64)> = series
            .points
            .iter()
            .map(|(d, kwh)| ((*d - first).num_days(), *kwh))
            .collect();

        chart
            .draw_series(LineSeries::new(points.iter().copied(), color.stroke_width(2)))
            .map_err(render_err)?
            .label(series.building.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
        chart
            .draw_series(points.iter().map(|p| Circle::new(*p, 3, color.filled())))
            .map_err(render_err)?;
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(render_err)?;
    Ok(())
}

fn draw_weekly_average<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    data: &DashboardData,
) -> Result<()> {
    let names: Vec<&str> = data.weekly_average.iter().map(|(n, _)| n.as_str()).collect();
    let y_max = data
        .weekly_average
        .iter()
        .map(|(_, avg)| *avg)
        .fold(0.0, f64::max);

    let mut chart = ChartBuilder::on(area)
        .caption("Average Weekly Consumption per Building", ("sans-serif", 22))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(70)
        .build_cartesian_2d(
            (0u32..names.len() as u32).into_segmented(),
            0f64..y_upper(y_max),
        )
        .map_err(render_err)?;

    let label_building = |v: &SegmentValue<u32>| match v {
        SegmentValue::CenterOf(i) => names
            .get(*i as usize)
            .map(|n| n.to_string())
            .unwrap_or_default(),
        _ => String::new(),
    };
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc("Building")
        .y_desc("Average kWh")
        .x_label_formatter(&label_building)
        .draw()
        .map_err(render_err)?;

    chart
        .draw_series(data.weekly_average.iter().enumerate().map(|(i, (_, avg))| {
            let i = i as u32;
            let mut bar = Rectangle::new(
                [
                    (SegmentValue::Exact(i), 0.0),
                    (SegmentValue::Exact(i + 1), *avg),
                ],
                BLUE.mix(0.7).filled(),
            );
            bar.set_margin(0, 0, 15, 15);
            bar
        }))
        .map_err(render_err)?;
    Ok(())
}

fn draw_hourly_scatter<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    data: &DashboardData,
) -> Result<()> {
    let y_max = data
        .hourly_points
        .iter()
        .map(|(_, kwh)| *kwh)
        .fold(0.0, f64::max);

    let mut chart = ChartBuilder::on(area)
        .caption("Peak-Hour Consumption (Hour vs kWh)", ("sans-serif", 22))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(70)
        .build_cartesian_2d(0i32..24i32, 0f64..y_upper(y_max))
        .map_err(render_err)?;

    chart
        .configure_mesh()
        .x_desc("Hour of Day")
        .y_desc("kWh")
        .x_labels(24)
        .draw()
        .map_err(render_err)?;

    chart
        .draw_series(
            data.hourly_points
                .iter()
                .map(|(hour, kwh)| Circle::new((*hour as i32, *kwh), 3, RED.mix(0.6).filled())),
        )
        .map_err(render_err)?;
    Ok(())
}
