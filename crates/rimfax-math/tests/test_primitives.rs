//! Cross-module checks for the matrix primitives.

use approx::assert_relative_eq;
use num_complex::Complex64;
use rimfax_math::{CMatrix, SparseMatrix, hermitian_eigen, pack_dense, unpack_dense};

fn c(re: f64, im: f64) -> Complex64 {
    Complex64::new(re, im)
}

/// Maximally mixed 2-qubit state.
fn mixed_state(dim: usize) -> CMatrix {
    CMatrix::identity(dim).scale(c(1.0 / dim as f64, 0.0))
}

#[test]
fn packed_roundtrip_through_flat_buffer() {
    let mut m = CMatrix::zeros(4);
    for i in 0..4 {
        for j in 0..4 {
            m.set(i, j, c(i as f64, j as f64));
        }
    }
    let flat = pack_dense(&m);
    assert_eq!(flat.len(), 32);
    // Row-major interleaved: entry (1, 2) lands at (1*4+2)*2.
    assert_relative_eq!(flat[12], 1.0);
    assert_relative_eq!(flat[13], 2.0);
    assert_eq!(unpack_dense(&flat, 4).unwrap(), m);
}

#[test]
fn dissipator_identity_built_from_sparse_pieces() {
    // For L = σ⁻ and ρ maximally mixed, L ρ L† − ½{L†L, ρ} has trace zero.
    let l = SparseMatrix::from_triplets(&[0.0, 1.0, 1.0, 0.0], 2).unwrap();
    let rho = mixed_state(2);

    let l_rho = l.mul_dense(&rho).unwrap();
    let l_rho_ldag = l.adjoint().dense_mul(&l_rho).unwrap();
    let ldl = l.adjoint().matmul(&l).unwrap();
    let anti = ldl.mul_dense(&rho).unwrap().add(&ldl.dense_mul(&rho).unwrap()).unwrap();
    let dissipator = l_rho_ldag.sub(&anti.scale(c(0.5, 0.0))).unwrap();

    assert_relative_eq!(dissipator.trace().re, 0.0, epsilon = 1e-14);
    assert_relative_eq!(dissipator.trace().im, 0.0, epsilon = 1e-14);
}

#[test]
fn eigen_spectrum_of_mixed_state_is_flat() {
    let rho = mixed_state(4);
    let (values, vectors) = hermitian_eigen(&rho).unwrap();
    for v in values {
        assert_relative_eq!(v, 0.25, epsilon = 1e-12);
    }
    // Eigenvector columns stay unit norm.
    for col in 0..4 {
        let norm: f64 = (0..4).map(|row| vectors.get(row, col).norm_sqr()).sum();
        assert_relative_eq!(norm, 1.0, epsilon = 1e-10);
    }
}
