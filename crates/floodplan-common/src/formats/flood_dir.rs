//! Flood series stored as a directory of GRD files
//!
//! Each day contributes three grids named `H_   {day}.grd`, `vx_   {day}.grd`
//! and `vy_   {day}.grd`, with the day right-aligned to two characters.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{FormatError, Result};
use crate::formats::grd::{read_grd_file, write_grd_file};
use crate::types::flood::{FloodDay, FloodSeries};

/// Height grid prefix
pub const HEIGHT_PREFIX: &str = "H";
/// Velocity-x grid prefix
pub const VX_PREFIX: &str = "vx";
/// Velocity-y grid prefix
pub const VY_PREFIX: &str = "vy";

/// File name of one grid of a flood day
pub fn entry_name(prefix: &str, day: u32) -> String {
    format!("{prefix}_   {day:>2}.grd")
}

fn entry_path(dir: &Path, prefix: &str, day: u32) -> Result<PathBuf> {
    let path = dir.join(entry_name(prefix, day));
    if path.is_file() {
        Ok(path)
    } else {
        Err(FormatError::MissingFile(path.display().to_string()).into())
    }
}

/// Load days `start..=end` from a directory
pub fn read_flood_dir(dir: impl AsRef<Path>, start: u32, end: u32) -> Result<FloodSeries> {
    let dir = dir.as_ref();
    let mut days = Vec::with_capacity(end.saturating_sub(start) as usize + 1);
    for day in start..=end {
        let h = read_grd_file(entry_path(dir, HEIGHT_PREFIX, day)?)?;
        let vx = read_grd_file(entry_path(dir, VX_PREFIX, day)?)?;
        let vy = read_grd_file(entry_path(dir, VY_PREFIX, day)?)?;
        debug!(day, width = h.width(), height = h.height(), "Loaded flood day");
        days.push(FloodDay::new(day, h, vx, vy)?);
    }
    let series = FloodSeries::new(days)?;
    info!(dir = %dir.display(), days = series.len(), "Loaded flood series");
    Ok(series)
}

/// Store every day of a series into a directory
pub fn write_flood_dir(series: &FloodSeries, dir: impl AsRef<Path>) -> Result<()> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir)?;
    for day in series.days() {
        write_grd_file(&day.h, dir.join(entry_name(HEIGHT_PREFIX, day.day)))?;
        write_grd_file(&day.vx, dir.join(entry_name(VX_PREFIX, day.day)))?;
        write_grd_file(&day.vy, dir.join(entry_name(VY_PREFIX, day.day)))?;
    }
    Ok(())
}
