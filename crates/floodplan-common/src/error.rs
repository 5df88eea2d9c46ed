//! Error types for Floodplan
//!
//! Provides a unified error type and domain-specific error variants

use thiserror::Error;

use crate::types::channel::ChannelId;

/// Result type alias using FloodplanError
pub type Result<T> = std::result::Result<T, FloodplanError>;

/// Unified error type for Floodplan operations
#[derive(Debug, Error)]
pub enum FloodplanError {
    // Grid access errors
    #[error("Grid error: {0}")]
    Grid(#[from] GridError),

    // Tree construction errors
    #[error("Topology error: {0}")]
    Topology(#[from] TopologyError),

    // File format errors
    #[error("Format error: {0}")]
    Format(#[from] FormatError),

    // Storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    // Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Grid access and shape errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GridError {
    #[error("Cell ({x}, {y}) is outside a {width}x{height} grid")]
    OutOfBounds {
        x: i64,
        y: i64,
        width: usize,
        height: usize,
    },

    #[error("Grid dimensions mismatch: expected {expected_width}x{expected_height}, got {width}x{height}")]
    DimensionMismatch {
        expected_width: usize,
        expected_height: usize,
        width: usize,
        height: usize,
    },

    #[error("Grid has {actual} values, expected {expected}")]
    ValueCount { expected: usize, actual: usize },
}

/// Channel tree invariant violations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TopologyError {
    #[error("Duplicate channel id: {0}")]
    DuplicateChannel(ChannelId),

    #[error("Channel {parent} references unknown child {child}")]
    UnknownChild { parent: ChannelId, child: ChannelId },

    #[error("Channel not found: {0}")]
    UnknownChannel(ChannelId),

    #[error("Channel {child} has multiple parents: {first} and {second}")]
    MultipleParents {
        child: ChannelId,
        first: ChannelId,
        second: ChannelId,
    },

    #[error("Tree has no root channel")]
    NoRoot,

    #[error("Tree has multiple roots: {0:?}")]
    MultipleRoots(Vec<ChannelId>),

    #[error("Channel {0} is not reachable from the root")]
    Unreachable(ChannelId),
}

/// File format parse errors
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Unexpected end of input: {0}")]
    UnexpectedEof(String),

    #[error("Invalid grid header tag: {0:?}")]
    InvalidTag([u8; 4]),

    #[error("Invalid grid dimensions: {width}x{height}")]
    InvalidDimensions { width: i64, height: i64 },

    #[error("Missing flood series file: {0}")]
    MissingFile(String),

    #[error("Invalid flood archive: {0}")]
    Archive(String),
}

// Implement From for common external error types
impl From<serde_json::Error> for FloodplanError {
    fn from(err: serde_json::Error) -> Self {
        FloodplanError::Serialization(err.to_string())
    }
}

impl From<zip::result::ZipError> for FloodplanError {
    fn from(err: zip::result::ZipError) -> Self {
        FloodplanError::Format(FormatError::Archive(err.to_string()))
    }
}

impl From<std::io::Error> for FloodplanError {
    fn from(err: std::io::Error) -> Self {
        FloodplanError::Storage(err.to_string())
    }
}

impl From<anyhow::Error> for FloodplanError {
    fn from(err: anyhow::Error) -> Self {
        FloodplanError::Internal(err.to_string())
    }
}
