//! Flat numeric encoding for matrix data crossing crate boundaries.
//!
//! Density matrices travel between the engine and its consumers as flat
//! `f64` sequences with interleaved real/imaginary parts in row-major order:
//! `[re_00, im_00, re_01, im_01, ...]`. Consumers must know the dimension to
//! reshape correctly, so the serde-facing [`PackedState`] carries it as a
//! header.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::error::{MathError, MathResult};
use crate::matrix::CMatrix;

/// Pack a dense matrix into interleaved re/im row-major form.
pub fn pack_dense(m: &CMatrix) -> Vec<f64> {
    let mut out = Vec::with_capacity(m.dim() * m.dim() * 2);
    for v in m.as_slice() {
        out.push(v.re);
        out.push(v.im);
    }
    out
}

/// Unpack an interleaved re/im row-major buffer into a dense matrix.
///
/// The buffer must hold exactly `dim * dim * 2` values.
pub fn unpack_dense(data: &[f64], dim: usize) -> MathResult<CMatrix> {
    let expected = dim * dim * 2;
    if data.len() != expected {
        return Err(MathError::BadPackedLength {
            dim,
            len: data.len(),
            expected,
        });
    }
    let complex = data
        .chunks_exact(2)
        .map(|pair| Complex64::new(pair[0], pair[1]))
        .collect();
    CMatrix::from_data(dim, complex)
}

/// A dense matrix in wire form: dimension header plus interleaved buffer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackedState {
    /// Matrix dimension (rows == columns).
    pub dim: usize,
    /// Interleaved re/im values, row-major, length `dim * dim * 2`.
    pub data: Vec<f64>,
}

impl PackedState {
    /// Pack a matrix.
    pub fn from_matrix(m: &CMatrix) -> Self {
        Self {
            dim: m.dim(),
            data: pack_dense(m),
        }
    }

    /// Reconstruct the matrix, validating the buffer length.
    pub fn to_matrix(&self) -> MathResult<CMatrix> {
        unpack_dense(&self.data, self.dim)
    }
}
