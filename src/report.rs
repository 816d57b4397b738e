use std::io::Write;

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::Serialize;

use crate::batch::ResultSet;
use crate::skyline::{Peak, Skyline};

/// How a result set is written out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Ranked list per start point
    Text,
    /// One row per skyline peak
    Csv,
    /// The full result set
    Json,
}

// ---------------------------------------------------------------------------
// Labels and chart data
// ---------------------------------------------------------------------------

/// Kilometres, rounded to whole numbers for display.
pub fn rounded_km(metres: f64) -> f64 {
    (metres / 1000.0).round()
}

/// `"<rank>. <name> (<elevation> m, <km> km)"`, as used for legends and map overlays.
pub fn label(rank: usize, peak: &Peak) -> String {
    format!(
        "{rank}. {} ({} m, {} km)",
        peak.name,
        peak.elevation,
        rounded_km(peak.distance)
    )
}

/// `(distance in km, elevation in m)` points for plotting one skyline.
pub fn chart_series(skyline: &Skyline) -> Vec<(f64, f64)> {
    skyline
        .iter()
        .map(|p| (p.distance / 1000.0, p.elevation as f64))
        .collect()
}

// ---------------------------------------------------------------------------
// Writers
// ---------------------------------------------------------------------------

pub fn write_report<W: Write>(results: &ResultSet, format: OutputFormat, out: W) -> Result<()> {
    match format {
        OutputFormat::Text => write_text(results, out),
        OutputFormat::Csv => write_csv(results, out),
        OutputFormat::Json => write_json(results, out),
    }
}

pub fn write_text<W: Write>(results: &ResultSet, mut out: W) -> Result<()> {
    for entry in results {
        writeln!(out, "Next higher peaks from {}:", entry.start)?;
        for (i, peak) in entry.skyline.iter().enumerate() {
            writeln!(out, "{}, {}", label(i + 1, peak), peak.location)?;
        }
    }
    out.flush().context("flushing report")
}

#[derive(Serialize)]
struct CsvRow<'a> {
    start: &'a str,
    start_lat: f64,
    start_lon: f64,
    rank: usize,
    name: &'a str,
    elevation_m: i32,
    distance_m: f64,
    distance_km: f64,
    lat: f64,
    lon: f64,
}

pub fn write_csv<W: Write>(results: &ResultSet, out: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    for entry in results {
        for (i, peak) in entry.skyline.iter().enumerate() {
            writer
                .serialize(CsvRow {
                    start: &entry.start.name,
                    start_lat: entry.start.location.latitude,
                    start_lon: entry.start.location.longitude,
                    rank: i + 1,
                    name: &peak.name,
                    elevation_m: peak.elevation,
                    distance_m: peak.distance,
                    distance_km: peak.distance / 1000.0,
                    lat: peak.location.latitude,
                    lon: peak.location.longitude,
                })
                .context("writing CSV row")?;
        }
    }
    writer.flush().context("flushing CSV")
}

pub fn write_json<W: Write>(results: &ResultSet, mut out: W) -> Result<()> {
    serde_json::to_writer_pretty(&mut out, results).context("writing JSON")?;
    writeln!(out)?;
    out.flush().context("flushing report")
}
