//! Charging-curve CLI: profiles and SoC queries for a configured bus fleet.

mod cli;

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result, bail};
use clap::Parser;
use ebus_charging::config::FleetConfig;
use ebus_charging::io::export::{write_csv, write_json};
use ebus_charging::planner::ChargePlanner;
use ebus_charging::profile::ChargeProfile;
use ebus_charging::vehicle::{InMemoryCatalog, VehicleCatalog, VehicleTypeId};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::cli::{Args, Command, FleetArgs, Format, VehicleArgs};

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    match args.command {
        Command::Profile(args) => {
            let (planner, id) = open(&args.vehicle)?;
            let profile = planner.profile(id, args.vehicle.resolution.resolution())?;
            info!(%id, samples = profile.len(), "Profile ready");

            match &args.out {
                Some(path) => {
                    let file = File::create(path)
                        .with_context(|| format!("cannot create \"{}\"", path.display()))?;
                    let mut writer = BufWriter::new(file);
                    render(&profile, args.format, &mut writer)?;
                    writer.flush()?;
                    info!(path = %path.display(), "Profile written");
                }
                None => render(&profile, args.format, &mut io::stdout().lock())?,
            }
            Ok(())
        }

        Command::Soc(args) => {
            let (planner, id) = open(&args.vehicle)?;
            let resolution = args.vehicle.resolution.resolution();
            let profile = planner.profile(id, resolution)?;
            let start = args.from.unwrap_or_else(|| profile.soc_min());
            let soc = planner.soc_after_charging(id, resolution, start, args.hours)?;
            println!(
                "{:.1}% -> {:.1}% after {:.2} h",
                start * 100.0,
                soc * 100.0,
                args.hours
            );
            Ok(())
        }

        Command::Duration(args) => {
            let (planner, id) = open(&args.vehicle)?;
            let resolution = args.vehicle.resolution.resolution();
            let profile = planner.profile(id, resolution)?;
            let from = args.from.unwrap_or_else(|| profile.soc_min());
            let to = args.to.unwrap_or_else(|| profile.soc_max());
            let hours = planner.charging_duration(id, resolution, from, to)?;
            println!(
                "{:.1}% -> {:.1}% takes {:.2} h ({:.0} min)",
                from * 100.0,
                to * 100.0,
                hours,
                hours * 60.0
            );
            Ok(())
        }

        Command::Validate(args) => {
            let fleet = load_fleet(&args)?;
            let errors = fleet.validate();
            if !errors.is_empty() {
                for e in &errors {
                    eprintln!("{e}");
                }
                bail!("{} configuration error(s)", errors.len());
            }
            println!(
                "fleet is valid: {} curve(s), {} vehicle type(s)",
                fleet.curve.len(),
                fleet.vehicle_type.len()
            );
            Ok(())
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

/// Loads the fleet: `--fleet` takes priority, then `--preset`.
fn load_fleet(args: &FleetArgs) -> Result<FleetConfig> {
    let fleet = match &args.fleet {
        Some(path) => FleetConfig::from_toml_file(Path::new(path))?,
        None => FleetConfig::from_preset(&args.preset)?,
    };
    Ok(fleet)
}

fn open(args: &VehicleArgs) -> Result<(ChargePlanner<InMemoryCatalog>, VehicleTypeId)> {
    let fleet = load_fleet(&args.fleet)?;
    let catalog = fleet.catalog()?;
    let id = resolve_vehicle(&catalog, &args.vehicle)?;

    let mut planner = ChargePlanner::new(catalog);
    if let Some(resolution) = fleet.profile.resolution() {
        planner = planner.with_default_resolution(resolution);
    }
    Ok((planner, id))
}

/// Accepts either a numeric id or a vehicle type name.
fn resolve_vehicle(catalog: &InMemoryCatalog, key: &str) -> Result<VehicleTypeId> {
    if let Ok(raw) = key.parse::<u32>() {
        let id = VehicleTypeId(raw);
        if catalog.vehicle_type(id).is_some() {
            return Ok(id);
        }
    }
    match catalog.find_by_name(key) {
        Some(vehicle_type) => Ok(vehicle_type.id),
        None => bail!(
            "no vehicle type \"{key}\"; known: {}",
            catalog
                .iter()
                .map(|v| format!("{} ({})", v.name, v.id.0))
                .collect::<Vec<_>>()
                .join(", ")
        ),
    }
}

fn render(profile: &ChargeProfile, format: Format, writer: &mut impl Write) -> Result<()> {
    match format {
        Format::Table => {
            writeln!(writer, "{:>10}  {:>7}", "time (h)", "SoC")?;
            for s in profile.samples() {
                writeln!(writer, "{:>10.4}  {:>6.2}%", s.time_h, s.soc * 100.0)?;
            }
            writeln!(writer, "\nfull after {:.3} h", profile.time_to_full())?;
        }
        Format::Csv => write_csv(profile, writer)?,
        Format::Json => write_json(profile, writer)?,
    }
    Ok(())
}
