//! Error types for sparse matrix construction.

use thiserror::Error;

/// Errors that can occur while building sparse matrices.
#[derive(Debug, Error)]
pub enum Error {
    /// Two dimensions that must agree do not.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Structural arrays are inconsistent (non-monotone row pointers,
    /// out-of-range column indices, wrong value buffer length).
    #[error("Invalid sparse structure: {0}")]
    InvalidStructure(String),

    /// An entry index lies outside the matrix.
    #[error("Entry ({row}, {col}) outside a {nrows}x{ncols} matrix")]
    EntryOutOfBounds {
        row: usize,
        col: usize,
        nrows: usize,
        ncols: usize,
    },
}

/// Result type for sparse matrix construction.
pub type Result<T> = std::result::Result<T, Error>;
