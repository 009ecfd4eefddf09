use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use ebus_charging::profile::Resolution;

#[derive(Parser)]
#[command(author, version, about, propagate_version = true)]
pub struct Args {
    /// Log at debug level (overridden by `RUST_LOG`).
    #[clap(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print or export the charge profile of a vehicle type.
    Profile(ProfileArgs),

    /// SoC after charging a vehicle type for some hours.
    Soc(SocArgs),

    /// Hours needed to charge a vehicle type between two SoC values.
    Duration(DurationArgs),

    /// Check a fleet and report every configuration error.
    Validate(FleetArgs),
}

#[derive(Parser)]
pub struct FleetArgs {
    /// Fleet TOML file.
    #[clap(long, env = "EBUS_FLEET", conflicts_with = "preset")]
    pub fleet: Option<PathBuf>,

    /// Built-in fleet used when no file is given.
    #[clap(long, default_value = "standard_bus")]
    pub preset: String,
}

#[derive(Parser)]
pub struct ResolutionArgs {
    /// SoC step between profile samples.
    #[clap(long, conflicts_with = "samples")]
    pub precision: Option<f64>,

    /// Number of profile samples.
    #[clap(long)]
    pub samples: Option<usize>,
}

impl ResolutionArgs {
    pub fn resolution(&self) -> Option<Resolution> {
        match (self.precision, self.samples) {
            (Some(step), _) => Some(Resolution::precision(step)),
            (None, Some(num)) => Some(Resolution::samples(num)),
            (None, None) => None,
        }
    }
}

#[derive(Parser)]
pub struct VehicleArgs {
    #[clap(flatten)]
    pub fleet: FleetArgs,

    /// Vehicle type id or name.
    #[clap(long)]
    pub vehicle: String,

    #[clap(flatten)]
    pub resolution: ResolutionArgs,
}

#[derive(Copy, Clone, Default, ValueEnum)]
pub enum Format {
    #[default]
    Table,
    Csv,
    Json,
}

#[derive(Parser)]
pub struct ProfileArgs {
    #[clap(flatten)]
    pub vehicle: VehicleArgs,

    #[clap(long, value_enum, default_value_t)]
    pub format: Format,

    /// Write to this file instead of stdout.
    #[clap(long)]
    pub out: Option<PathBuf>,
}

#[derive(Parser)]
pub struct SocArgs {
    #[clap(flatten)]
    pub vehicle: VehicleArgs,

    /// Charging time in hours.
    #[clap(long)]
    pub hours: f64,

    /// SoC when charging starts; defaults to the curve's minimum.
    #[clap(long)]
    pub from: Option<f64>,
}

#[derive(Parser)]
pub struct DurationArgs {
    #[clap(flatten)]
    pub vehicle: VehicleArgs,

    /// Starting SoC; defaults to the curve's minimum.
    #[clap(long)]
    pub from: Option<f64>,

    /// Target SoC; defaults to the curve's maximum.
    #[clap(long)]
    pub to: Option<f64>,
}
