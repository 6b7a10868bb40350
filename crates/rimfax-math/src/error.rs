//! Error types for the math crate.

use thiserror::Error;

/// Errors produced by matrix construction and arithmetic.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MathError {
    /// Two operands (or an operand and an owner) disagree on dimension.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch {
        /// Dimension required by the operation.
        expected: usize,
        /// Dimension actually supplied.
        got: usize,
    },

    /// A packed buffer does not hold exactly dim×dim complex entries.
    #[error("packed buffer holds {len} values but a {dim}x{dim} matrix needs {expected}")]
    BadPackedLength {
        /// Target matrix dimension.
        dim: usize,
        /// Length of the supplied buffer.
        len: usize,
        /// Required length (dim * dim * 2).
        expected: usize,
    },

    /// A triplet stream is not a whole number of (row, col, re, im) quads.
    #[error("triplet stream length {0} is not a multiple of 4")]
    BadTripletLength(usize),

    /// A triplet addresses an entry outside the matrix.
    #[error("triplet ({row}, {col}) outside a {dim}x{dim} matrix")]
    TripletOutOfRange {
        /// Row index of the offending triplet.
        row: usize,
        /// Column index of the offending triplet.
        col: usize,
        /// Matrix dimension.
        dim: usize,
    },

    /// Eigendecomposition requested on an empty matrix.
    #[error("eigendecomposition of an empty (0x0) matrix")]
    EmptyMatrix,
}

/// Result type for math operations.
pub type MathResult<T> = Result<T, MathError>;
