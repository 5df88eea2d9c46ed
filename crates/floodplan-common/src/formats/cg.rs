//! CG text format for channel trees
//!
//! ```text
//! N
//! id pointCount
//! x y
//! ...
//! M
//! parentId childId
//! ...
//! ```
//!
//! Connection order defines child order. Channels are written top-down.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

use tracing::debug;

use crate::error::{FloodplanError, FormatError, Result};
use crate::types::channel::{Channel, ChannelId, ChannelPoint, ChannelTree};

/// Upper bound on capacity reserved from counts read in the file
const MAX_PREALLOC: usize = 4096;

/// Line cursor that tracks 1-based line numbers
struct Lines<R> {
    inner: std::io::Lines<R>,
    line: usize,
}

impl<R: BufRead> Lines<R> {
    fn new(reader: R) -> Self {
        Self {
            inner: reader.lines(),
            line: 0,
        }
    }

    fn next_line(&mut self, what: &str) -> Result<String> {
        loop {
            match self.inner.next() {
                Some(line) => {
                    self.line += 1;
                    let line = line?;
                    if !line.trim().is_empty() {
                        return Ok(line);
                    }
                }
                None => return Err(FormatError::UnexpectedEof(what.to_string()).into()),
            }
        }
    }

    fn parse_error(&self, message: impl Into<String>) -> FloodplanError {
        FormatError::Parse {
            line: self.line,
            message: message.into(),
        }
        .into()
    }

    fn fields<T: FromStr, const N: usize>(&mut self, what: &str) -> Result<[T; N]> {
        let line = self.next_line(what)?;
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < N {
            return Err(self.parse_error(format!(
                "expected {N} fields for {what}, found {}",
                parts.len()
            )));
        }
        let mut values = Vec::with_capacity(N);
        for part in &parts[..N] {
            let value = part
                .parse::<T>()
                .map_err(|_| self.parse_error(format!("invalid number '{part}' in {what}")))?;
            values.push(value);
        }
        values
            .try_into()
            .map_err(|_| self.parse_error(format!("malformed {what}")))
    }
}

/// Read a channel tree from CG text
pub fn read_cg<R: BufRead>(reader: R) -> Result<ChannelTree> {
    let mut lines = Lines::new(reader);

    let [channel_count] = lines.fields::<usize, 1>("channel count")?;
    let mut channels = Vec::with_capacity(channel_count.min(MAX_PREALLOC));
    for _ in 0..channel_count {
        let [id, point_count] = lines.fields::<i64, 2>("channel header")?;
        if point_count < 0 {
            return Err(lines.parse_error(format!("negative point count {point_count}")));
        }
        let mut channel = Channel::new(id);
        channel
            .points
            .reserve((point_count as usize).min(MAX_PREALLOC));
        for _ in 0..point_count {
            let [x, y] = lines.fields::<i32, 2>("channel point")?;
            channel.points.push(ChannelPoint::new(x, y));
        }
        channels.push(channel);
    }

    // first occurrence wins; duplicates are rejected by ChannelTree::new
    let mut slots: HashMap<ChannelId, usize> = HashMap::with_capacity(channels.len());
    for (i, channel) in channels.iter().enumerate() {
        slots.entry(channel.id).or_insert(i);
    }

    let [connection_count] = lines.fields::<usize, 1>("connection count")?;
    for _ in 0..connection_count {
        let [parent, child] = lines.fields::<i64, 2>("connection")?;
        let slot = *slots
            .get(&ChannelId(parent))
            .ok_or_else(|| lines.parse_error(format!("unknown parent channel {parent}")))?;
        channels[slot].children.push(ChannelId(child));
    }

    let tree = ChannelTree::new(channels)?;
    debug!(channels = tree.len(), root = ?tree.root(), "Read CG channel tree");
    Ok(tree)
}

/// Write a channel tree as CG text, channels in top-down order
pub fn write_cg<W: Write>(tree: &ChannelTree, mut writer: W) -> Result<()> {
    writeln!(writer, "{}", tree.len())?;
    let mut connections = Vec::with_capacity(tree.len().saturating_sub(1));
    for channel in tree.channels() {
        writeln!(writer, "{} {}", channel.id, channel.points.len())?;
        for point in &channel.points {
            writeln!(writer, "{} {}", point.x, point.y)?;
        }
        connections.extend(channel.children.iter().map(|&child| (channel.id, child)));
    }
    writeln!(writer, "{}", connections.len())?;
    for (parent, child) in connections {
        writeln!(writer, "{parent} {child}")?;
    }
    writer.flush()?;
    Ok(())
}

/// Read a CG file from disk
pub fn read_cg_file(path: impl AsRef<Path>) -> Result<ChannelTree> {
    let file = File::open(path.as_ref())?;
    read_cg(BufReader::new(file))
}

/// Write a CG file to disk
pub fn write_cg_file(tree: &ChannelTree, path: impl AsRef<Path>) -> Result<()> {
    let file = File::create(path.as_ref())?;
    write_cg(tree, BufWriter::new(file))
}
