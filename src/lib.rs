//! Charging-curve model and SoC profile tables for battery-electric bus fleets.

pub mod config;
/// Constant-power/taper charging curves.
pub mod curve;
pub mod error;
/// Profile export.
pub mod io;
pub mod planner;
/// Time/SoC profile tables, interpolation, and caching.
pub mod profile;
pub mod vehicle;

pub use error::{ComputationError, Error, Result};
