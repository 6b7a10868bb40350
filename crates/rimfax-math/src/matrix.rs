//! Dense complex matrices.
//!
//! `CMatrix` is a square, row-major matrix of `Complex64` — the workhorse
//! for density matrices and Hamiltonians. Dimensions in this workspace stay
//! small (2..=64), so all operations are straightforward O(dim²)/O(dim³)
//! loops; no blocking or SIMD tricks.

use num_complex::Complex64;

use crate::error::{MathError, MathResult};

/// A square complex matrix, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct CMatrix {
    dim: usize,
    data: Vec<Complex64>,
}

impl CMatrix {
    /// All-zero matrix of the given dimension.
    pub fn zeros(dim: usize) -> Self {
        Self {
            dim,
            data: vec![Complex64::new(0.0, 0.0); dim * dim],
        }
    }

    /// Identity matrix of the given dimension.
    pub fn identity(dim: usize) -> Self {
        let mut m = Self::zeros(dim);
        for i in 0..dim {
            m.set(i, i, Complex64::new(1.0, 0.0));
        }
        m
    }

    /// Build from an existing row-major buffer.
    ///
    /// Fails if the buffer does not hold exactly dim² entries.
    pub fn from_data(dim: usize, data: Vec<Complex64>) -> MathResult<Self> {
        if data.len() != dim * dim {
            return Err(MathError::DimensionMismatch {
                expected: dim * dim,
                got: data.len(),
            });
        }
        Ok(Self { dim, data })
    }

    /// Matrix dimension (rows == columns).
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Entry at (row, col).
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> Complex64 {
        self.data[i * self.dim + j]
    }

    /// Overwrite the entry at (row, col).
    #[inline]
    pub fn set(&mut self, i: usize, j: usize, v: Complex64) {
        self.data[i * self.dim + j] = v;
    }

    /// Row-major view of the underlying buffer.
    pub fn as_slice(&self) -> &[Complex64] {
        &self.data
    }

    /// Element-wise sum.
    pub fn add(&self, other: &Self) -> MathResult<Self> {
        self.check_dim(other)?;
        let data = self
            .data
            .iter()
            .zip(other.data.iter())
            .map(|(a, b)| a + b)
            .collect();
        Ok(Self {
            dim: self.dim,
            data,
        })
    }

    /// Element-wise difference.
    pub fn sub(&self, other: &Self) -> MathResult<Self> {
        self.check_dim(other)?;
        let data = self
            .data
            .iter()
            .zip(other.data.iter())
            .map(|(a, b)| a - b)
            .collect();
        Ok(Self {
            dim: self.dim,
            data,
        })
    }

    /// In-place `self += scale * other`. The accumulation pattern used by
    /// integrator steps, kept allocation-free.
    pub fn add_scaled_assign(&mut self, other: &Self, scale: Complex64) -> MathResult<()> {
        self.check_dim(other)?;
        for (a, b) in self.data.iter_mut().zip(other.data.iter()) {
            *a += scale * b;
        }
        Ok(())
    }

    /// Scalar multiple.
    pub fn scale(&self, s: Complex64) -> Self {
        Self {
            dim: self.dim,
            data: self.data.iter().map(|a| a * s).collect(),
        }
    }

    /// Matrix product `self · other`.
    pub fn matmul(&self, other: &Self) -> MathResult<Self> {
        self.check_dim(other)?;
        let d = self.dim;
        let mut out = Self::zeros(d);
        for i in 0..d {
            for k in 0..d {
                let a_ik = self.get(i, k);
                if a_ik.norm_sqr() == 0.0 {
                    continue;
                }
                for j in 0..d {
                    out.data[i * d + j] += a_ik * other.get(k, j);
                }
            }
        }
        Ok(out)
    }

    /// Conjugate transpose (dagger).
    pub fn adjoint(&self) -> Self {
        let d = self.dim;
        let mut out = Self::zeros(d);
        for i in 0..d {
            for j in 0..d {
                out.set(j, i, self.get(i, j).conj());
            }
        }
        out
    }

    /// Trace.
    pub fn trace(&self) -> Complex64 {
        (0..self.dim).map(|i| self.get(i, i)).sum()
    }

    /// Commutator `[self, other] = self·other − other·self`.
    pub fn commutator(&self, other: &Self) -> MathResult<Self> {
        let ab = self.matmul(other)?;
        let ba = other.matmul(self)?;
        ab.sub(&ba)
    }

    /// Anticommutator `{self, other} = self·other + other·self`.
    pub fn anticommutator(&self, other: &Self) -> MathResult<Self> {
        let ab = self.matmul(other)?;
        let ba = other.matmul(self)?;
        ab.add(&ba)
    }

    /// Frobenius norm `sqrt(Σ |a_ij|²)`.
    pub fn frobenius_norm(&self) -> f64 {
        self.data.iter().map(|a| a.norm_sqr()).sum::<f64>().sqrt()
    }

    /// True when `‖self − self†‖_F < tol`.
    pub fn is_hermitian(&self, tol: f64) -> bool {
        let d = self.dim;
        let mut acc = 0.0;
        for i in 0..d {
            for j in 0..d {
                let delta = self.get(i, j) - self.get(j, i).conj();
                acc += delta.norm_sqr();
            }
        }
        acc.sqrt() < tol
    }

    /// Hermitian part `½(A + A†)` — the drift-correction projection.
    pub fn hermitize(&self) -> Self {
        let d = self.dim;
        let mut out = Self::zeros(d);
        let half = Complex64::new(0.5, 0.0);
        for i in 0..d {
            for j in 0..d {
                out.set(i, j, half * (self.get(i, j) + self.get(j, i).conj()));
            }
        }
        out
    }

    fn check_dim(&self, other: &Self) -> MathResult<()> {
        if self.dim != other.dim {
            return Err(MathError::DimensionMismatch {
                expected: self.dim,
                got: other.dim,
            });
        }
        Ok(())
    }
}
