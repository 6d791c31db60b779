//! Domain types shared by the campus energy crates.
//!
//! Meter readings, the row parser and its rejection taxonomy, timestamp
//! helpers, number formatting, the error type and CLI settings.

pub mod error;
pub mod formatting;
pub mod models;
pub mod parser;
pub mod settings;
pub mod time_utils;

pub use error::{EnergyError, Result};
