//! Data layer for the campus energy dashboard.
//!
//! Responsible for discovering and reading per-building CSV files, holding the
//! validated readings per building, and deriving the daily, weekly and
//! building-level aggregate views.

pub mod aggregator;
pub mod building;
pub mod manager;
pub mod pipeline;
pub mod reader;

pub use energy_core as core;
