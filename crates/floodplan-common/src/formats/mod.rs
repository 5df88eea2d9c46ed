//! File formats
//!
//! Codecs are thin: they validate structure and hand back the in-memory types,
//! leaving all topology and shape rules to the type constructors.

pub mod cg;
pub mod flood_dir;
pub mod flood_zip;
pub mod grd;
