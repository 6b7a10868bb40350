//! Hermitian eigendecomposition.
//!
//! Wraps nalgebra's `SymmetricEigen` so the rest of the workspace never
//! touches nalgebra types directly. Inputs are hermitized first: by the drift
//! policy, tiny anti-Hermitian error accumulated by integration is corrected
//! silently rather than reported.

use nalgebra::DMatrix;
use num_complex::Complex64;

use crate::error::{MathError, MathResult};
use crate::matrix::CMatrix;

/// Eigendecomposition of a Hermitian matrix.
///
/// Returns eigenvalues in ascending order and the matching eigenvectors as
/// the columns of the returned matrix.
pub fn hermitian_eigen(m: &CMatrix) -> MathResult<(Vec<f64>, CMatrix)> {
    let d = m.dim();
    if d == 0 {
        return Err(MathError::EmptyMatrix);
    }
    let herm = m.hermitize();
    let dm = DMatrix::from_fn(d, d, |i, j| herm.get(i, j));
    let eig = dm.symmetric_eigen();

    let mut order: Vec<usize> = (0..d).collect();
    order.sort_by(|&a, &b| {
        eig.eigenvalues[a]
            .partial_cmp(&eig.eigenvalues[b])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let eigenvalues: Vec<f64> = order.iter().map(|&k| eig.eigenvalues[k]).collect();
    let mut vectors = CMatrix::zeros(d);
    for (sorted_col, &orig_col) in order.iter().enumerate() {
        for row in 0..d {
            vectors.set(row, sorted_col, eig.eigenvectors[(row, orig_col)]);
        }
    }
    Ok((eigenvalues, vectors))
}

/// Largest eigenvalue and its (unit-norm) eigenvector.
pub fn dominant_eigenpair(m: &CMatrix) -> MathResult<(f64, Vec<Complex64>)> {
    let (values, vectors) = hermitian_eigen(m)?;
    let d = m.dim();
    let top = d - 1;
    let vector = (0..d).map(|row| vectors.get(row, top)).collect();
    Ok((values[top], vector))
}
