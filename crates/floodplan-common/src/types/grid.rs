//! Dense scalar grids
//!
//! Values are stored row-major (`y` outer, `x` inner), which is also the
//! on-disk order of the GRD format.

use serde::{Deserialize, Serialize};

use crate::error::GridError;
use crate::types::channel::ChannelPoint;

/// Integer cell coordinate inside a grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    pub x: usize,
    pub y: usize,
}

impl Cell {
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

/// Georeferenced extent of a grid
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridBounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl GridBounds {
    pub fn new(min_x: f64, max_x: f64, min_y: f64, max_y: f64) -> Self {
        Self {
            min_x,
            max_x,
            min_y,
            max_y,
        }
    }

    /// Unit bounds matching cell indices
    pub fn unit(width: usize, height: usize) -> Self {
        Self::new(0.0, width as f64, 0.0, height as f64)
    }
}

/// Dense 2D scalar grid with a no-data sentinel
#[derive(Debug, Clone, PartialEq)]
pub struct GridMap {
    width: usize,
    height: usize,
    bounds: GridBounds,
    values: Vec<f64>,
}

impl GridMap {
    /// Sentinel for cells without data (`1.70141e38` stored as f32)
    pub const NO_DATA: f64 = 1.70141E+38_f32 as f64;

    /// Create a grid filled with `initial`
    pub fn new(width: usize, height: usize, bounds: GridBounds, initial: f64) -> Self {
        Self {
            width,
            height,
            bounds,
            values: vec![initial; width * height],
        }
    }

    /// Create a grid with unit bounds filled with `initial`
    pub fn filled(width: usize, height: usize, initial: f64) -> Self {
        Self::new(width, height, GridBounds::unit(width, height), initial)
    }

    /// Create a grid from row-major values
    pub fn from_values(
        width: usize,
        height: usize,
        bounds: GridBounds,
        values: Vec<f64>,
    ) -> Result<Self, GridError> {
        if values.len() != width * height {
            return Err(GridError::ValueCount {
                expected: width * height,
                actual: values.len(),
            });
        }
        Ok(Self {
            width,
            height,
            bounds,
            values,
        })
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    pub fn bounds(&self) -> GridBounds {
        self.bounds
    }

    /// Physical width of one cell
    pub fn step_x(&self) -> f64 {
        (self.bounds.max_x - self.bounds.min_x) / self.width as f64
    }

    /// Physical height of one cell
    pub fn step_y(&self) -> f64 {
        (self.bounds.max_y - self.bounds.min_y) / self.height as f64
    }

    /// Raw row-major values
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    #[inline]
    fn offset(&self, x: usize, y: usize) -> Option<usize> {
        (x < self.width && y < self.height).then(|| y * self.width + x)
    }

    /// Whether signed coordinates fall inside the grid
    pub fn contains(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && (x as u64) < self.width as u64 && (y as u64) < self.height as u64
    }

    /// Value at a cell, `None` outside the grid
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Option<f64> {
        self.offset(x, y).map(|i| self.values[i])
    }

    /// Value at a cell
    #[inline]
    pub fn at(&self, cell: Cell) -> Option<f64> {
        self.get(cell.x, cell.y)
    }

    /// Value at signed coordinates, failing outside the grid
    pub fn try_get(&self, x: i64, y: i64) -> Result<f64, GridError> {
        let cell = self.cell_at(x, y)?;
        Ok(self.values[cell.y * self.width + cell.x])
    }

    /// Set a cell value
    pub fn set(&mut self, x: usize, y: usize, value: f64) -> Result<(), GridError> {
        let i = self.offset(x, y).ok_or(GridError::OutOfBounds {
            x: x as i64,
            y: y as i64,
            width: self.width,
            height: self.height,
        })?;
        self.values[i] = value;
        Ok(())
    }

    /// Convert signed coordinates into an in-bounds cell
    pub fn cell_at(&self, x: i64, y: i64) -> Result<Cell, GridError> {
        if self.contains(x, y) {
            Ok(Cell::new(x as usize, y as usize))
        } else {
            Err(GridError::OutOfBounds {
                x,
                y,
                width: self.width,
                height: self.height,
            })
        }
    }

    /// Cell under a channel point
    pub fn cell_of(&self, point: ChannelPoint) -> Result<Cell, GridError> {
        self.cell_at(point.x as i64, point.y as i64)
    }

    /// Whether a value is the no-data sentinel
    #[inline]
    pub fn is_no_data(value: f64) -> bool {
        value >= Self::NO_DATA
    }

    /// Smallest data value (`0.0` for a grid without data)
    pub fn min_z(&self) -> f64 {
        self.data_values().fold(None, |acc: Option<f64>, v| {
            Some(acc.map_or(v, |m| m.min(v)))
        })
        .unwrap_or(0.0)
    }

    /// Largest data value (`0.0` for a grid without data)
    pub fn max_z(&self) -> f64 {
        self.data_values().fold(None, |acc: Option<f64>, v| {
            Some(acc.map_or(v, |m| m.max(v)))
        })
        .unwrap_or(0.0)
    }

    fn data_values(&self) -> impl Iterator<Item = f64> + '_ {
        self.values
            .iter()
            .copied()
            .filter(|v| !v.is_nan() && !Self::is_no_data(*v))
    }

    /// Whether two grids have the same dimensions
    pub fn same_shape(&self, other: &GridMap) -> bool {
        self.width == other.width && self.height == other.height
    }

    /// Fail unless `other` has the same dimensions
    pub fn ensure_same_shape(&self, other: &GridMap) -> Result<(), GridError> {
        self.ensure_shape(other.width, other.height)
    }

    /// Fail unless the grid is `width` x `height`
    pub fn ensure_shape(&self, width: usize, height: usize) -> Result<(), GridError> {
        if self.width == width && self.height == height {
            Ok(())
        } else {
            Err(GridError::DimensionMismatch {
                expected_width: width,
                expected_height: height,
                width: self.width,
                height: self.height,
            })
        }
    }

    /// All cells in row-major order
    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        (0..self.height).flat_map(move |y| (0..self.width).map(move |x| Cell::new(x, y)))
    }
}
