//! # Floodplan Common
//!
//! Shared types, errors, and file formats for the Floodplan donor-acceptor planner.
//!
//! ## Core Types
//!
//! - [`ChannelTree`]: reach network as a validated tree with id and parent lookups
//! - [`GridMap`]: dense 2D scalar grid with georeferenced bounds and a no-data sentinel
//! - [`FloodSeries`]: per-day height / velocity grids from a hydrodynamic run
//! - [`FloodMask`]: cells that were flooded at least once
//!
//! ## Formats
//!
//! - [`formats::cg`]: CG text format for channel trees
//! - [`formats::grd`]: DSBB binary grid format
//! - [`formats::flood_dir`]: flood series stored as a directory of GRD files
//! - [`formats::flood_zip`]: the same flood series packed in a zip archive

pub mod error;
pub mod formats;
pub mod types;

// Re-export commonly used types at crate root
pub use error::{FloodplanError, FormatError, GridError, Result, TopologyError};
pub use types::{
    channel::{Channel, ChannelId, ChannelPoint, ChannelTree, TreeRecord},
    flood::{FloodDay, FloodMask, FloodSeries},
    grid::{Cell, GridBounds, GridMap},
};

/// Floodplan version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Seconds in one simulated flood day
pub const SECONDS_PER_DAY: f64 = 86_400.0;
