//! CSV and JSON export for charge profiles.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::profile::ChargeProfile;

/// Column header for CSV export.
const HEADER: [&str; 2] = ["time_h", "soc"];

/// Exports a profile to a CSV file at the given path.
///
/// Writes a header row followed by one row per sample. Produces
/// deterministic output for identical profiles.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_csv(profile: &ChargeProfile, path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let buf = io::BufWriter::new(file);
    write_csv(profile, buf)
}

/// Writes a profile as CSV to any writer.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_csv(profile: &ChargeProfile, writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(HEADER)?;
    for s in profile.samples() {
        wtr.write_record(&[format!("{:.6}", s.time_h), format!("{:.6}", s.soc)])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Writes a profile as pretty-printed JSON (`{"samples": [{"time_h", "soc"}, ...]}`).
///
/// # Errors
///
/// Returns an `io::Error` if serialization or writing fails.
pub fn write_json(profile: &ChargeProfile, mut writer: impl Write) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut writer, profile)?;
    writeln!(writer)
}

/// Exports a profile to a JSON file at the given path.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_json(profile: &ChargeProfile, path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let mut buf = io::BufWriter::new(file);
    write_json(profile, &mut buf)?;
    buf.flush()
}
