//! Core data types for Floodplan

pub mod channel;
pub mod flood;
pub mod grid;
