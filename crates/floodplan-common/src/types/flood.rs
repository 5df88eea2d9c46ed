//! Flood series from a hydrodynamic run
//!
//! A series is an ordered list of days, each carrying water height and the two
//! velocity components on grids of identical shape.

use crate::error::GridError;
use crate::types::grid::{Cell, GridMap};

/// One simulated day
#[derive(Debug, Clone, PartialEq)]
pub struct FloodDay {
    /// Day number within the run
    pub day: u32,
    /// Water height
    pub h: GridMap,
    /// Velocity along x
    pub vx: GridMap,
    /// Velocity along y
    pub vy: GridMap,
}

impl FloodDay {
    /// Create a day, validating that all three grids share dimensions
    pub fn new(day: u32, h: GridMap, vx: GridMap, vy: GridMap) -> Result<Self, GridError> {
        h.ensure_same_shape(&vx)?;
        h.ensure_same_shape(&vy)?;
        Ok(Self { day, h, vx, vy })
    }

    /// Flow speed at a cell, `None` if any component is missing
    pub fn speed_at(&self, cell: Cell) -> Option<f64> {
        let vx = self.vx.at(cell).filter(|v| !GridMap::is_no_data(*v))?;
        let vy = self.vy.at(cell).filter(|v| !GridMap::is_no_data(*v))?;
        Some((vx * vx + vy * vy).sqrt())
    }

    /// Water height at a cell, `None` for no-data or outside the grid
    pub fn height_at(&self, cell: Cell) -> Option<f64> {
        self.h.at(cell).filter(|v| !GridMap::is_no_data(*v))
    }
}

/// Ordered sequence of flood days
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FloodSeries {
    days: Vec<FloodDay>,
}

impl FloodSeries {
    /// Create a series; every day must share the first day's dimensions
    pub fn new(days: Vec<FloodDay>) -> Result<Self, GridError> {
        if let Some(first) = days.first() {
            for day in &days[1..] {
                first.h.ensure_same_shape(&day.h)?;
            }
        }
        Ok(Self { days })
    }

    /// Series without any days
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn days(&self) -> &[FloodDay] {
        &self.days
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Fail unless the series matches the given dimensions (an empty series
    /// matches anything)
    pub fn ensure_shape(&self, width: usize, height: usize) -> Result<(), GridError> {
        match self.days.first() {
            Some(day) => day.h.ensure_shape(width, height),
            None => Ok(()),
        }
    }
}

/// Cells that were flooded at least once
#[derive(Debug, Clone, PartialEq)]
pub struct FloodMask {
    width: usize,
    height: usize,
    flooded: Vec<bool>,
}

impl FloodMask {
    /// Mask with every cell dry
    pub fn dry(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            flooded: vec![false; width * height],
        }
    }

    /// A cell is flooded iff its height is positive on any day
    pub fn from_series(series: &FloodSeries, width: usize, height: usize) -> Result<Self, GridError> {
        series.ensure_shape(width, height)?;
        let mut mask = Self::dry(width, height);
        for day in series.days() {
            for (flag, &h) in mask.flooded.iter_mut().zip(day.h.values()) {
                if h > 0.0 && !GridMap::is_no_data(h) {
                    *flag = true;
                }
            }
        }
        Ok(mask)
    }

    /// A cell is flooded iff the map value is non-zero
    pub fn from_map(map: &GridMap) -> Self {
        Self {
            width: map.width(),
            height: map.height(),
            flooded: map
                .values()
                .iter()
                .map(|&v| v != 0.0 && !GridMap::is_no_data(v))
                .collect(),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Whether a cell was flooded; cells outside the mask are dry
    #[inline]
    pub fn is_flooded(&self, cell: Cell) -> bool {
        cell.x < self.width && cell.y < self.height && self.flooded[cell.y * self.width + cell.x]
    }

    /// Number of flooded cells
    pub fn flooded_count(&self) -> usize {
        self.flooded.iter().filter(|f| **f).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(n: u32, h: GridMap) -> FloodDay {
        let (w, ht) = (h.width(), h.height());
        FloodDay::new(n, h, GridMap::filled(w, ht, 0.0), GridMap::filled(w, ht, 0.0)).unwrap()
    }

    #[test]
    fn test_mask_from_series_any_day() {
        let mut a = GridMap::filled(2, 1, 0.0);
        a.set(0, 0, 0.5).unwrap();
        let mut b = GridMap::filled(2, 1, 0.0);
        b.set(1, 0, GridMap::NO_DATA).unwrap();
        let series = FloodSeries::new(vec![day(1, a), day(2, b)]).unwrap();
        let mask = FloodMask::from_series(&series, 2, 1).unwrap();
        assert!(mask.is_flooded(Cell::new(0, 0)));
        assert!(!mask.is_flooded(Cell::new(1, 0)));
        assert_eq!(mask.flooded_count(), 1);
    }

    #[test]
    fn test_series_dimension_mismatch() {
        let err = FloodSeries::new(vec![
            day(1, GridMap::filled(2, 2, 0.0)),
            day(2, GridMap::filled(3, 2, 0.0)),
        ])
        .unwrap_err();
        assert!(matches!(err, GridError::DimensionMismatch { .. }));
    }

    #[test]
    fn test_day_rejects_mismatched_velocity() {
        let err = FloodDay::new(
            1,
            GridMap::filled(2, 2, 0.0),
            GridMap::filled(2, 2, 0.0),
            GridMap::filled(2, 3, 0.0),
        );
        assert!(err.is_err());
    }

    #[test]
    fn test_speed_at() {
        let h = GridMap::filled(1, 1, 1.0);
        let d = FloodDay::new(1, h, GridMap::filled(1, 1, 3.0), GridMap::filled(1, 1, 4.0)).unwrap();
        assert_eq!(d.speed_at(Cell::new(0, 0)), Some(5.0));
        assert_eq!(d.speed_at(Cell::new(1, 0)), None);
    }
}
