//! Error types for the sandpile core

use thiserror::Error;

/// Errors raised by the sandpile core
#[derive(Debug, Error)]
pub enum SandpileError {
    #[error("initial rectangle must be at least 1x1, got {width}x{length}")]
    InvalidDimensions { width: usize, length: usize },

    #[error("coordinates ({x}, {y}) out of bounds for {width}x{length} layout")]
    OutOfBounds {
        x: i64,
        y: i64,
        width: usize,
        length: usize,
    },

    #[error("malformed layout entry on line {line}: {content:?} (expected `x y grains`)")]
    MalformedEntry { line: usize, content: String },

    #[error("a lattice window needs at least one coordinate")]
    EmptyWindow,

    #[error("grain count overflow at ({x}, {y})")]
    GrainOverflow { x: i64, y: i64 },
}

pub type Result<T> = std::result::Result<T, SandpileError>;
