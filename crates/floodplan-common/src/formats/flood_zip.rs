//! Flood series stored in a zip archive
//!
//! Entries use the same names as the directory layout
//! ([`entry_name`](crate::formats::flood_dir::entry_name)), at the archive root.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, Write};
use std::path::Path;

use tracing::{debug, info};
use zip::result::ZipError;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::{FormatError, Result};
use crate::formats::flood_dir::{entry_name, HEIGHT_PREFIX, VX_PREFIX, VY_PREFIX};
use crate::formats::grd::{decode_grd, encode_grd};
use crate::types::flood::{FloodDay, FloodSeries};
use crate::types::grid::GridMap;

fn read_entry<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    prefix: &str,
    day: u32,
) -> Result<GridMap> {
    let name = entry_name(prefix, day);
    let mut entry = match archive.by_name(&name) {
        Ok(entry) => entry,
        Err(ZipError::FileNotFound) => return Err(FormatError::MissingFile(name).into()),
        Err(err) => return Err(err.into()),
    };
    let mut data = Vec::with_capacity(entry.size().min(1 << 26) as usize);
    entry.read_to_end(&mut data)?;
    decode_grd(data.as_slice())
}

/// Load days `start..=end` from an open archive
pub fn read_flood_zip_from<R: Read + Seek>(
    reader: R,
    start: u32,
    end: u32,
) -> Result<FloodSeries> {
    let mut archive = ZipArchive::new(reader)?;
    let mut days = Vec::with_capacity(end.saturating_sub(start) as usize + 1);
    for day in start..=end {
        let h = read_entry(&mut archive, HEIGHT_PREFIX, day)?;
        let vx = read_entry(&mut archive, VX_PREFIX, day)?;
        let vy = read_entry(&mut archive, VY_PREFIX, day)?;
        debug!(day, width = h.width(), height = h.height(), "Loaded flood day");
        days.push(FloodDay::new(day, h, vx, vy)?);
    }
    Ok(FloodSeries::new(days)?)
}

/// Load days `start..=end` from a zip file
pub fn read_flood_zip(path: impl AsRef<Path>, start: u32, end: u32) -> Result<FloodSeries> {
    let path = path.as_ref();
    let series = read_flood_zip_from(BufReader::new(File::open(path)?), start, end)?;
    info!(archive = %path.display(), days = series.len(), "Loaded flood series");
    Ok(series)
}

/// Store every day of a series into an archive, returning the writer
pub fn write_flood_zip_to<W: Write + Seek>(series: &FloodSeries, writer: W) -> Result<W> {
    let mut zip = ZipWriter::new(writer);
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
    for day in series.days() {
        let grids = [(HEIGHT_PREFIX, &day.h), (VX_PREFIX, &day.vx), (VY_PREFIX, &day.vy)];
        for (prefix, grid) in grids {
            zip.start_file(entry_name(prefix, day.day), options)?;
            zip.write_all(&encode_grd(grid)?)?;
        }
    }
    Ok(zip.finish()?)
}

/// Store every day of a series into a zip file
pub fn write_flood_zip(series: &FloodSeries, path: impl AsRef<Path>) -> Result<()> {
    let mut writer = write_flood_zip_to(series, BufWriter::new(File::create(path.as_ref())?))?;
    writer.flush()?;
    Ok(())
}
