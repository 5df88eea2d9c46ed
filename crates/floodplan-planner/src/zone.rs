//! Spatial zones around channels
//!
//! A zone is every grid cell within Chebyshev radius `R` of any point of a
//! channel, clipped to the grid. Cells are deduplicated per channel and kept in
//! first-insertion order; zones of different channels may overlap.

use std::collections::{HashMap, HashSet};

use floodplan_common::{Cell, ChannelId, ChannelPoint, ChannelTree, GridError};
use tracing::debug;

/// Deduplicated cell buffer around one channel
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Zone {
    cells: Vec<Cell>,
}

impl Zone {
    /// Build the zone around `points` on a `width` x `height` grid
    ///
    /// Every point must lie inside the grid; only the radius is clipped.
    pub fn around(
        points: &[ChannelPoint],
        radius: usize,
        width: usize,
        height: usize,
    ) -> Result<Self, GridError> {
        let mut seen: HashSet<Cell> = HashSet::new();
        let mut cells = Vec::new();
        for point in points {
            let (px, py) = (point.x as i64, point.y as i64);
            if px < 0 || py < 0 || px as usize >= width || py as usize >= height {
                return Err(GridError::OutOfBounds {
                    x: px,
                    y: py,
                    width,
                    height,
                });
            }
            let (px, py) = (px as usize, py as usize);
            let x0 = px.saturating_sub(radius);
            let y0 = py.saturating_sub(radius);
            let x1 = (px + radius).min(width - 1);
            let y1 = (py + radius).min(height - 1);
            for y in y0..=y1 {
                for x in x0..=x1 {
                    let cell = Cell::new(x, y);
                    if seen.insert(cell) {
                        cells.push(cell);
                    }
                }
            }
        }
        Ok(Self { cells })
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn iter(&self) -> impl Iterator<Item = Cell> + '_ {
        self.cells.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Zones of every channel in a tree, computed once
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneIndex {
    radius: usize,
    width: usize,
    height: usize,
    zones: HashMap<ChannelId, Zone>,
}

impl ZoneIndex {
    /// Compute zones for all channels in one traversal
    pub fn build(
        tree: &ChannelTree,
        radius: usize,
        width: usize,
        height: usize,
    ) -> Result<Self, GridError> {
        let mut zones = HashMap::with_capacity(tree.len());
        for channel in tree.channels() {
            zones.insert(channel.id, Zone::around(&channel.points, radius, width, height)?);
        }
        debug!(
            channels = zones.len(),
            radius,
            cells = zones.values().map(Zone::len).sum::<usize>(),
            "Built zone index"
        );
        Ok(Self {
            radius,
            width,
            height,
            zones,
        })
    }

    /// Zone of a channel, `None` for channels outside the indexed tree
    pub fn zone_of(&self, id: ChannelId) -> Option<&Zone> {
        self.zones.get(&id)
    }

    pub fn radius(&self) -> usize {
        self.radius
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }
}
