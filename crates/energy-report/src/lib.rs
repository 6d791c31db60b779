//! Output sinks for the campus energy dashboard.
//!
//! Everything here is a projection of aggregates already computed by
//! [`energy_data::manager::BuildingManager`]: the executive summary text, the
//! CSV exports and the SVG dashboard.

pub mod dashboard;
pub mod export;
pub mod summary;
