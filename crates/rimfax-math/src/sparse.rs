//! Sparse complex matrices in CSR form.
//!
//! Lindblad operators are almost always sparse (a decay channel touches a
//! handful of entries of a 64×64 matrix), so dissipator products are computed
//! as sparse×dense at O(nnz·dim) instead of O(dim³).

use num_complex::Complex64;

use crate::error::{MathError, MathResult};
use crate::matrix::CMatrix;

/// Magnitude below which a triplet entry is treated as structural zero.
const ZERO_TOL: f64 = 1e-15;

/// A square complex matrix in compressed sparse row form.
#[derive(Debug, Clone, PartialEq)]
pub struct SparseMatrix {
    dim: usize,
    row_ptr: Vec<usize>,
    col_idx: Vec<usize>,
    values: Vec<Complex64>,
}

impl SparseMatrix {
    /// Build from a flat triplet stream `[row, col, re, im, row, col, ...]`.
    ///
    /// Entries with |re| and |im| both below 1e-15 are dropped; duplicate
    /// (row, col) entries are summed.
    pub fn from_triplets(triplets: &[f64], dim: usize) -> MathResult<Self> {
        if triplets.len() % 4 != 0 {
            return Err(MathError::BadTripletLength(triplets.len()));
        }

        let mut entries: Vec<(usize, usize, Complex64)> = Vec::with_capacity(triplets.len() / 4);
        for quad in triplets.chunks_exact(4) {
            let row = quad[0] as usize;
            let col = quad[1] as usize;
            let v = Complex64::new(quad[2], quad[3]);
            if row >= dim || col >= dim {
                return Err(MathError::TripletOutOfRange { row, col, dim });
            }
            if quad[2].abs() > ZERO_TOL || quad[3].abs() > ZERO_TOL {
                entries.push((row, col, v));
            }
        }
        entries.sort_by_key(|&(r, c, _)| (r, c));

        // Sum duplicate (row, col) entries.
        let mut merged: Vec<(usize, usize, Complex64)> = Vec::with_capacity(entries.len());
        for (r, c, v) in entries {
            match merged.last_mut() {
                Some((lr, lc, lv)) if *lr == r && *lc == c => *lv += v,
                _ => merged.push((r, c, v)),
            }
        }

        Ok(Self::from_sorted_entries(dim, merged))
    }

    fn from_sorted_entries(dim: usize, entries: Vec<(usize, usize, Complex64)>) -> Self {
        let mut row_ptr = vec![0usize; dim + 1];
        let mut col_idx = Vec::with_capacity(entries.len());
        let mut values = Vec::with_capacity(entries.len());
        for (r, c, v) in entries {
            col_idx.push(c);
            values.push(v);
            row_ptr[r + 1] = col_idx.len();
        }
        for r in 0..dim {
            if row_ptr[r + 1] < row_ptr[r] {
                row_ptr[r + 1] = row_ptr[r];
            }
        }
        Self {
            dim,
            row_ptr,
            col_idx,
            values,
        }
    }

    /// Matrix dimension.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of stored nonzeros.
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Fraction of entries that are structurally zero.
    pub fn sparsity(&self) -> f64 {
        if self.dim == 0 {
            return 1.0;
        }
        1.0 - self.nnz() as f64 / (self.dim * self.dim) as f64
    }

    /// Iterate stored entries as (row, col, value).
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, Complex64)> + '_ {
        (0..self.dim).flat_map(move |r| {
            (self.row_ptr[r]..self.row_ptr[r + 1])
                .map(move |k| (r, self.col_idx[k], self.values[k]))
        })
    }

    /// Conjugate transpose, re-compressed.
    pub fn adjoint(&self) -> Self {
        let mut entries: Vec<(usize, usize, Complex64)> = self
            .iter()
            .map(|(r, c, v)| (c, r, v.conj()))
            .collect();
        entries.sort_by_key(|&(r, c, _)| (r, c));
        Self::from_sorted_entries(self.dim, entries)
    }

    /// Sparse × dense product `self · rhs`, O(nnz·dim).
    pub fn mul_dense(&self, rhs: &CMatrix) -> MathResult<CMatrix> {
        self.check_dim(rhs.dim())?;
        let d = self.dim;
        let mut out = CMatrix::zeros(d);
        for (i, k, v) in self.iter() {
            for j in 0..d {
                let cur = out.get(i, j);
                out.set(i, j, cur + v * rhs.get(k, j));
            }
        }
        Ok(out)
    }

    /// Dense × sparse product `lhs · self`, O(nnz·dim).
    pub fn dense_mul(&self, lhs: &CMatrix) -> MathResult<CMatrix> {
        self.check_dim(lhs.dim())?;
        let d = self.dim;
        let mut out = CMatrix::zeros(d);
        for (k, j, v) in self.iter() {
            for i in 0..d {
                let cur = out.get(i, j);
                out.set(i, j, cur + lhs.get(i, k) * v);
            }
        }
        Ok(out)
    }

    /// Sparse × sparse product, used once per operator to cache `L†L`.
    pub fn matmul(&self, rhs: &Self) -> MathResult<Self> {
        self.check_dim(rhs.dim)?;
        let d = self.dim;
        let mut row_ptr = vec![0usize; d + 1];
        let mut col_idx = Vec::new();
        let mut values = Vec::new();
        let mut acc = vec![Complex64::new(0.0, 0.0); d];
        let mut mark = vec![false; d];
        let mut touched: Vec<usize> = Vec::new();

        for i in 0..d {
            touched.clear();
            for k_idx in self.row_ptr[i]..self.row_ptr[i + 1] {
                let k = self.col_idx[k_idx];
                let a_ik = self.values[k_idx];
                for j_idx in rhs.row_ptr[k]..rhs.row_ptr[k + 1] {
                    let j = rhs.col_idx[j_idx];
                    if !mark[j] {
                        mark[j] = true;
                        touched.push(j);
                    }
                    acc[j] += a_ik * rhs.values[j_idx];
                }
            }
            touched.sort_unstable();
            for &j in &touched {
                if acc[j].norm() > ZERO_TOL {
                    col_idx.push(j);
                    values.push(acc[j]);
                }
                acc[j] = Complex64::new(0.0, 0.0);
                mark[j] = false;
            }
            row_ptr[i + 1] = col_idx.len();
        }

        Ok(Self {
            dim: d,
            row_ptr,
            col_idx,
            values,
        })
    }

    /// Expand to a dense matrix.
    pub fn to_dense(&self) -> CMatrix {
        let mut out = CMatrix::zeros(self.dim);
        for (r, c, v) in self.iter() {
            out.set(r, c, v);
        }
        out
    }

    fn check_dim(&self, other: usize) -> MathResult<()> {
        if self.dim != other {
            return Err(MathError::DimensionMismatch {
                expected: self.dim,
                got: other,
            });
        }
        Ok(())
    }
}
