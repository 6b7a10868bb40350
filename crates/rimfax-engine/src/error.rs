//! Error types for the engine crate.

use thiserror::Error;

/// Errors produced by engine configuration and observable extraction.
///
/// Numerical drift (trace/Hermiticity error) is deliberately absent: it is
/// corrected silently by the per-call clamp, never reported.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EngineError {
    /// An operator or state does not match the engine's dimension.
    #[error("dimension mismatch: engine is {expected}-dimensional, got {got}")]
    DimensionMismatch {
        /// Dimension the engine was configured with.
        expected: usize,
        /// Dimension of the offending input.
        got: usize,
    },

    /// A per-qubit observable was requested with a qubit count that does not
    /// match the state dimension (dim must equal 2^num_qubits).
    #[error("state dimension {dim} does not match {num_qubits} qubits (need 2^{num_qubits})")]
    QubitCountMismatch {
        /// State dimension.
        dim: usize,
        /// Requested qubit count.
        num_qubits: usize,
    },

    /// A qubit selection does not name a usable qubit of the register
    /// (index out of range, or a pair naming the same qubit twice).
    #[error("invalid qubit selection {qubit} for a {num_qubits}-qubit state")]
    InvalidQubit {
        /// Offending qubit index.
        qubit: usize,
        /// Size of the register.
        num_qubits: usize,
    },

    /// Two state vectors of different lengths were compared.
    #[error("cannot compare state vectors of lengths {0} and {1}")]
    VectorLengthMismatch(usize, usize),

    /// Underlying matrix primitive error.
    #[error("matrix error: {0}")]
    Math(#[from] rimfax_math::MathError),
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
