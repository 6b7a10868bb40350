//! `rimfax-math` — dense and sparse complex matrix primitives.
//!
//! Foundation layer for the Rimfax evolution stack:
//!
//! - [`CMatrix`] — dense square complex matrices (add, multiply, adjoint,
//!   trace, commutators)
//! - [`SparseMatrix`] — CSR matrices for sparse Lindblad operators
//! - [`PackedState`] and the `pack_dense`/`unpack_dense` codec — the flat
//!   interleaved re/im wire format used at every crate boundary
//! - [`hermitian_eigen`] / [`dominant_eigenpair`] — Hermitian
//!   eigendecomposition (via nalgebra), used for entropies and dominant
//!   eigenstates
//!
//! Matrices here are small (dimension 2..=64); everything is plain loops over
//! row-major buffers.
//!
//! # Quick start
//!
//! ```rust
//! use num_complex::Complex64;
//! use rimfax_math::{CMatrix, PackedState};
//!
//! let mut h = CMatrix::zeros(2);
//! h.set(0, 1, Complex64::new(0.5, 0.0));
//! h.set(1, 0, Complex64::new(0.5, 0.0));
//! assert!(h.is_hermitian(1e-12));
//!
//! let wire = PackedState::from_matrix(&h);
//! assert_eq!(wire.to_matrix().unwrap(), h);
//! ```

pub mod codec;
pub mod eigen;
pub mod error;
pub mod matrix;
pub mod sparse;

pub use codec::{PackedState, pack_dense, unpack_dense};
pub use eigen::{dominant_eigenpair, hermitian_eigen};
pub use error::{MathError, MathResult};
pub use matrix::CMatrix;
pub use sparse::SparseMatrix;
