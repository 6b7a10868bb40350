//! Observable extraction from density matrices.
//!
//! Everything a presentation layer reads out of an evolved state: purity,
//! per-qubit Bloch coordinates, pairwise mutual information, and the dominant
//! eigenstate. Per-qubit observables require `dim == 2^num_qubits` and fail
//! loudly otherwise — a malformed dimension never yields a zero-filled
//! result.

use num_complex::Complex64;
use rimfax_math::{CMatrix, dominant_eigenpair, hermitian_eigen};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Eigenvalues below this carry no entropy.
const ENTROPY_EPS: f64 = 1e-15;

/// Purity `Tr(ρ²) ∈ [1/dim, 1]`.
///
/// For Hermitian ρ this is the squared Frobenius norm, O(dim²).
pub fn purity(rho: &CMatrix) -> f64 {
    let p = rho.frobenius_norm();
    (p * p).max(0.0)
}

/// Single-qubit reduced state and its Bloch-sphere coordinates.
///
/// Serialized flat (stride 8) this is the packet layout downstream force
/// layouts consume: `[p0, p1, x, y, z, r, theta, phi]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlochQubit {
    /// Ground-state population ⟨0|ρ_q|0⟩.
    pub p0: f64,
    /// Excited-state population ⟨1|ρ_q|1⟩.
    pub p1: f64,
    /// Bloch x = 2 Re ρ01.
    pub x: f64,
    /// Bloch y = −2 Im ρ01.
    pub y: f64,
    /// Bloch z = p0 − p1.
    pub z: f64,
    /// Bloch vector length.
    pub r: f64,
    /// Polar angle θ = acos(z/r), 0 for r ≈ 0.
    pub theta: f64,
    /// Azimuth φ = atan2(y, x).
    pub phi: f64,
}

impl BlochQubit {
    fn from_reduced(reduced: &CMatrix) -> Self {
        let p0 = reduced.get(0, 0).re;
        let p1 = reduced.get(1, 1).re;
        let coherence = reduced.get(0, 1);
        let x = 2.0 * coherence.re;
        let y = -2.0 * coherence.im;
        let z = p0 - p1;
        let r = (x * x + y * y + z * z).sqrt();
        let theta = if r > 1e-12 { (z / r).clamp(-1.0, 1.0).acos() } else { 0.0 };
        let phi = y.atan2(x);
        Self {
            p0,
            p1,
            x,
            y,
            z,
            r,
            theta,
            phi,
        }
    }
}

/// Flatten Bloch metrics into the stride-8 wire packet.
pub fn bloch_packet(qubits: &[BlochQubit]) -> Vec<f64> {
    let mut out = Vec::with_capacity(qubits.len() * 8);
    for q in qubits {
        out.extend_from_slice(&[q.p0, q.p1, q.x, q.y, q.z, q.r, q.theta, q.phi]);
    }
    out
}

/// Per-qubit Bloch metrics via single-qubit partial traces.
pub fn bloch_metrics(rho: &CMatrix, num_qubits: usize) -> EngineResult<Vec<BlochQubit>> {
    check_qubits(rho, num_qubits)?;
    (0..num_qubits)
        .map(|q| Ok(BlochQubit::from_reduced(&partial_trace_single(rho, q, num_qubits)?)))
        .collect()
}

/// Trace out every qubit except `qubit`, yielding its 2×2 reduced state.
///
/// Qubit q owns bit q of the basis index (little-endian).
pub fn partial_trace_single(
    rho: &CMatrix,
    qubit: usize,
    num_qubits: usize,
) -> EngineResult<CMatrix> {
    check_qubits(rho, num_qubits)?;
    check_qubit_index(qubit, num_qubits)?;
    let mut reduced = CMatrix::zeros(2);
    let others = num_qubits - 1;
    for a in 0..2usize {
        for b in 0..2usize {
            let mut sum = Complex64::new(0.0, 0.0);
            for other_bits in 0..(1usize << others) {
                let (mut row, mut col) = (0usize, 0usize);
                let mut bit_pos = 0;
                for q in 0..num_qubits {
                    if q == qubit {
                        row |= a << q;
                        col |= b << q;
                    } else {
                        let bit = (other_bits >> bit_pos) & 1;
                        row |= bit << q;
                        col |= bit << q;
                        bit_pos += 1;
                    }
                }
                sum += rho.get(row, col);
            }
            reduced.set(a, b, sum);
        }
    }
    Ok(reduced)
}

/// Trace out every qubit except `qubit_a` and `qubit_b`, yielding a 4×4
/// reduced state in basis |a b⟩ (qubit_a is the high bit).
pub fn partial_trace_pair(
    rho: &CMatrix,
    qubit_a: usize,
    qubit_b: usize,
    num_qubits: usize,
) -> EngineResult<CMatrix> {
    check_qubits(rho, num_qubits)?;
    check_qubit_index(qubit_a, num_qubits)?;
    check_qubit_index(qubit_b, num_qubits)?;
    if qubit_a == qubit_b {
        return Err(EngineError::InvalidQubit {
            qubit: qubit_b,
            num_qubits,
        });
    }
    let mut reduced = CMatrix::zeros(4);
    let others = num_qubits - 2;
    for row_ab in 0..4usize {
        for col_ab in 0..4usize {
            let a_row = (row_ab >> 1) & 1;
            let b_row = row_ab & 1;
            let a_col = (col_ab >> 1) & 1;
            let b_col = col_ab & 1;

            let mut sum = Complex64::new(0.0, 0.0);
            for other_bits in 0..(1usize << others) {
                let (mut row, mut col) = (0usize, 0usize);
                let mut bit_pos = 0;
                for q in 0..num_qubits {
                    if q == qubit_a {
                        row |= a_row << q;
                        col |= a_col << q;
                    } else if q == qubit_b {
                        row |= b_row << q;
                        col |= b_col << q;
                    } else {
                        let bit = (other_bits >> bit_pos) & 1;
                        row |= bit << q;
                        col |= bit << q;
                        bit_pos += 1;
                    }
                }
                sum += rho.get(row, col);
            }
            reduced.set(row_ab, col_ab, sum);
        }
    }
    Ok(reduced)
}

/// Von Neumann entropy `S(ρ) = −Σ λ log2 λ` in bits, clamped non-negative.
pub fn von_neumann_entropy(reduced: &CMatrix) -> EngineResult<f64> {
    let (values, _) = hermitian_eigen(reduced)?;
    let mut s = 0.0;
    for lambda in values {
        if lambda > ENTROPY_EPS {
            s -= lambda * lambda.log2();
        }
    }
    Ok(s.max(0.0))
}

/// How pairwise mutual information is computed.
///
/// The classical mode reads only the diagonal populations; it is cheaper (no
/// eigendecompositions) but blind to entanglement, so it is an explicit mode
/// a caller opts into, never a silent fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MiMode {
    /// Full quantum MI from von Neumann entropies of partial traces.
    Quantum,
    /// Classical MI of the diagonal probability distribution.
    ClassicalDiagonal,
}

/// Mutual information `I(i:j)` for every qubit pair, in upper-triangular
/// order `[(0,1), (0,2), …, (n−2,n−1)]`, length n(n−1)/2.
///
/// Quantum mode computes each single-qubit entropy once and reuses it across
/// all pairs (O(n) single-qubit eigendecompositions, not O(n²)).
pub fn mutual_information_all(
    rho: &CMatrix,
    num_qubits: usize,
    mode: MiMode,
) -> EngineResult<Vec<f64>> {
    check_qubits(rho, num_qubits)?;
    if num_qubits < 2 {
        return Ok(Vec::new());
    }
    match mode {
        MiMode::Quantum => quantum_mi(rho, num_qubits),
        MiMode::ClassicalDiagonal => classical_mi(rho, num_qubits),
    }
}

fn quantum_mi(rho: &CMatrix, num_qubits: usize) -> EngineResult<Vec<f64>> {
    let single_entropies: Vec<f64> = (0..num_qubits)
        .map(|q| von_neumann_entropy(&partial_trace_single(rho, q, num_qubits)?))
        .collect::<EngineResult<_>>()?;

    let mut out = Vec::with_capacity(num_qubits * (num_qubits - 1) / 2);
    for i in 0..num_qubits {
        for j in (i + 1)..num_qubits {
            let s_ab = von_neumann_entropy(&partial_trace_pair(rho, i, j, num_qubits)?)?;
            let mi = single_entropies[i] + single_entropies[j] - s_ab;
            out.push(mi.max(0.0));
        }
    }
    Ok(out)
}

fn classical_mi(rho: &CMatrix, num_qubits: usize) -> EngineResult<Vec<f64>> {
    let dim = rho.dim();
    let probs: Vec<f64> = (0..dim).map(|k| rho.get(k, k).re.max(0.0)).collect();

    // Marginal P(q = 1) per qubit.
    let marginals: Vec<f64> = (0..num_qubits)
        .map(|q| {
            probs
                .iter()
                .enumerate()
                .filter(|(k, _)| (k >> q) & 1 == 1)
                .map(|(_, p)| p)
                .sum()
        })
        .collect();

    let mut out = Vec::with_capacity(num_qubits * (num_qubits - 1) / 2);
    for i in 0..num_qubits {
        for j in (i + 1)..num_qubits {
            // Joint distribution over (bit_i, bit_j).
            let mut joint = [[0.0f64; 2]; 2];
            for (k, p) in probs.iter().enumerate() {
                joint[(k >> i) & 1][(k >> j) & 1] += p;
            }
            let p_i = [1.0 - marginals[i], marginals[i]];
            let p_j = [1.0 - marginals[j], marginals[j]];
            let mut mi = 0.0;
            for a in 0..2 {
                for b in 0..2 {
                    let p_ab = joint[a][b];
                    if p_ab > ENTROPY_EPS && p_i[a] > ENTROPY_EPS && p_j[b] > ENTROPY_EPS {
                        mi += p_ab * (p_ab / (p_i[a] * p_j[b])).log2();
                    }
                }
            }
            out.push(mi.max(0.0));
        }
    }
    Ok(out)
}

/// Dominant eigenpair of ρ.
///
/// For a pure state the eigenvalue is ≈1 (jointly with purity ≈1).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DominantEigenstate {
    /// Largest eigenvalue of ρ.
    pub eigenvalue: f64,
    /// The matching unit-norm eigenvector.
    pub amplitudes: Vec<Complex64>,
}

/// Full eigendecomposition, keeping the top eigenpair.
pub fn dominant_eigenstate(rho: &CMatrix) -> EngineResult<DominantEigenstate> {
    let (eigenvalue, amplitudes) = dominant_eigenpair(rho)?;
    Ok(DominantEigenstate {
        eigenvalue,
        amplitudes,
    })
}

/// Squared cosine overlap `|⟨a|b⟩|² / (⟨a|a⟩⟨b|b⟩)` between two state
/// vectors, e.g. dominant eigenstates of different subsystems.
pub fn cos2_overlap(a: &[Complex64], b: &[Complex64]) -> EngineResult<f64> {
    if a.len() != b.len() {
        return Err(EngineError::VectorLengthMismatch(a.len(), b.len()));
    }
    let mut inner = Complex64::new(0.0, 0.0);
    let mut norm_a = 0.0;
    let mut norm_b = 0.0;
    for (x, y) in a.iter().zip(b.iter()) {
        inner += x.conj() * y;
        norm_a += x.norm_sqr();
        norm_b += y.norm_sqr();
    }
    if norm_a < ENTROPY_EPS || norm_b < ENTROPY_EPS {
        return Ok(0.0);
    }
    Ok((inner.norm_sqr() / (norm_a * norm_b)).clamp(0.0, 1.0))
}

fn check_qubits(rho: &CMatrix, num_qubits: usize) -> EngineResult<()> {
    if num_qubits >= usize::BITS as usize || rho.dim() != 1usize << num_qubits {
        return Err(EngineError::QubitCountMismatch {
            dim: rho.dim(),
            num_qubits,
        });
    }
    Ok(())
}

fn check_qubit_index(qubit: usize, num_qubits: usize) -> EngineResult<()> {
    if qubit >= num_qubits {
        return Err(EngineError::InvalidQubit { qubit, num_qubits });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn c(re: f64, im: f64) -> Complex64 {
        Complex64::new(re, im)
    }

    /// Bell state (|00⟩ + |11⟩)/√2 as a density matrix.
    fn bell() -> CMatrix {
        let mut rho = CMatrix::zeros(4);
        let h = c(0.5, 0.0);
        rho.set(0, 0, h);
        rho.set(0, 3, h);
        rho.set(3, 0, h);
        rho.set(3, 3, h);
        rho
    }

    #[test]
    fn purity_bounds() {
        let mixed = CMatrix::identity(4).scale(c(0.25, 0.0));
        assert_relative_eq!(purity(&mixed), 0.25, epsilon = 1e-12);
        assert_relative_eq!(purity(&bell()), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn bloch_of_plus_state_points_along_x() {
        let mut rho = CMatrix::zeros(2);
        let h = c(0.5, 0.0);
        rho.set(0, 0, h);
        rho.set(0, 1, h);
        rho.set(1, 0, h);
        rho.set(1, 1, h);
        let bloch = bloch_metrics(&rho, 1).unwrap();
        assert_eq!(bloch.len(), 1);
        assert_relative_eq!(bloch[0].x, 1.0, epsilon = 1e-12);
        assert_relative_eq!(bloch[0].y, 0.0, epsilon = 1e-12);
        assert_relative_eq!(bloch[0].z, 0.0, epsilon = 1e-12);
        assert_relative_eq!(bloch[0].r, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn bloch_packet_is_stride_eight() {
        let rho = CMatrix::identity(4).scale(c(0.25, 0.0));
        let bloch = bloch_metrics(&rho, 2).unwrap();
        let packet = bloch_packet(&bloch);
        assert_eq!(packet.len(), 16);
        // Maximally mixed: p0 = p1 = 0.5, zero vector.
        assert_relative_eq!(packet[0], 0.5, epsilon = 1e-12);
        assert_relative_eq!(packet[5], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn bell_state_reduced_qubits_are_mixed() {
        let rho = bell();
        let reduced = partial_trace_single(&rho, 0, 2).unwrap();
        assert_relative_eq!(reduced.get(0, 0).re, 0.5, epsilon = 1e-12);
        assert_relative_eq!(reduced.get(1, 1).re, 0.5, epsilon = 1e-12);
        assert_relative_eq!(reduced.get(0, 1).norm(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn bell_state_mutual_information_is_two_bits() {
        let mi = mutual_information_all(&bell(), 2, MiMode::Quantum).unwrap();
        assert_eq!(mi.len(), 1);
        assert_relative_eq!(mi[0], 2.0, epsilon = 1e-9);
    }

    #[test]
    fn classical_mode_sees_only_one_bit_of_bell_correlation() {
        let mi = mutual_information_all(&bell(), 2, MiMode::ClassicalDiagonal).unwrap();
        assert_eq!(mi.len(), 1);
        assert_relative_eq!(mi[0], 1.0, epsilon = 1e-9);
    }

    #[test]
    fn product_state_has_zero_mutual_information() {
        // |00⟩⟨00|
        let mut rho = CMatrix::zeros(4);
        rho.set(0, 0, c(1.0, 0.0));
        for mode in [MiMode::Quantum, MiMode::ClassicalDiagonal] {
            let mi = mutual_information_all(&rho, 2, mode).unwrap();
            assert_relative_eq!(mi[0], 0.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn mi_order_is_upper_triangular() {
        let rho = CMatrix::identity(8).scale(c(1.0 / 8.0, 0.0));
        let mi = mutual_information_all(&rho, 3, MiMode::Quantum).unwrap();
        assert_eq!(mi.len(), 3); // (0,1), (0,2), (1,2)
        for v in mi {
            assert_relative_eq!(v, 0.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn malformed_dimension_is_an_error_not_zeros() {
        let rho = CMatrix::zeros(3);
        assert!(matches!(
            bloch_metrics(&rho, 2),
            Err(EngineError::QubitCountMismatch { dim: 3, num_qubits: 2 })
        ));
        assert!(matches!(
            mutual_information_all(&rho, 2, MiMode::Quantum),
            Err(EngineError::QubitCountMismatch { .. })
        ));
    }

    #[test]
    fn partial_trace_rejects_bad_qubit_selections() {
        let rho = bell();
        // Out-of-range index and zero-qubit register are errors, not panics.
        assert!(matches!(
            partial_trace_single(&rho, 2, 2),
            Err(EngineError::InvalidQubit { qubit: 2, num_qubits: 2 })
        ));
        let scalar = CMatrix::identity(1);
        assert!(matches!(
            partial_trace_single(&scalar, 0, 0),
            Err(EngineError::InvalidQubit { .. })
        ));
        assert!(matches!(
            partial_trace_pair(&scalar, 0, 1, 0),
            Err(EngineError::InvalidQubit { .. })
        ));
        // A pair must name two distinct qubits.
        assert!(matches!(
            partial_trace_pair(&rho, 1, 1, 2),
            Err(EngineError::InvalidQubit { qubit: 1, num_qubits: 2 })
        ));
    }

    #[test]
    fn dominant_eigenstate_of_pure_state() {
        let rho = bell();
        let dom = dominant_eigenstate(&rho).unwrap();
        assert_relative_eq!(dom.eigenvalue, 1.0, epsilon = 1e-9);
        assert_relative_eq!(purity(&rho), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn cos2_overlap_properties() {
        let zero = vec![c(1.0, 0.0), c(0.0, 0.0)];
        let one = vec![c(0.0, 0.0), c(1.0, 0.0)];
        let s = std::f64::consts::FRAC_1_SQRT_2;
        let plus = vec![c(s, 0.0), c(s, 0.0)];

        assert_relative_eq!(cos2_overlap(&zero, &zero).unwrap(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(cos2_overlap(&zero, &one).unwrap(), 0.0, epsilon = 1e-12);
        assert_relative_eq!(cos2_overlap(&zero, &plus).unwrap(), 0.5, epsilon = 1e-12);
        assert_relative_eq!(
            cos2_overlap(&plus, &zero).unwrap(),
            cos2_overlap(&zero, &plus).unwrap(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn overlap_length_mismatch_is_an_error() {
        let a = vec![c(1.0, 0.0)];
        let b = vec![c(1.0, 0.0), c(0.0, 0.0)];
        assert!(matches!(
            cos2_overlap(&a, &b),
            Err(EngineError::VectorLengthMismatch(1, 2))
        ));
    }
}
