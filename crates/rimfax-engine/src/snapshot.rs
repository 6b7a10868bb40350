//! Point-in-time captures of a subsystem's state and observables.

use rimfax_math::{CMatrix, PackedState};
use serde::{Deserialize, Serialize};

use crate::error::EngineResult;
use crate::observables::{
    BlochQubit, DominantEigenstate, MiMode, bloch_metrics, dominant_eigenstate,
    mutual_information_all, purity,
};

/// Which observables [`Snapshot::capture`] computes.
///
/// Eigendecompositions dominate the cost, so mutual information and the
/// dominant eigenstate are individually skippable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservableSet {
    /// Compute pairwise mutual information, and in which mode.
    pub mutual_info: Option<MiMode>,
    /// Compute the dominant eigenstate.
    pub dominant: bool,
}

impl ObservableSet {
    /// Everything, in full quantum mode.
    pub const FULL: Self = Self {
        mutual_info: Some(MiMode::Quantum),
        dominant: true,
    };

    /// Purity and Bloch metrics only.
    pub const CHEAP: Self = Self {
        mutual_info: None,
        dominant: false,
    };
}

/// One simulated instant: the full state plus derived observables.
///
/// Snapshots are plain data, cheap to clone relative to producing them, and
/// serialize losslessly for transport across a boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Simulation time this snapshot corresponds to.
    pub sim_time: f64,
    /// Flat-packed density matrix.
    pub state: PackedState,
    /// Tr(ρ²).
    pub purity: f64,
    /// One entry per qubit.
    pub bloch: Vec<BlochQubit>,
    /// Upper-triangular pairwise mutual information, empty when skipped.
    pub mutual_info: Vec<f64>,
    /// Largest eigenpair of ρ, when requested.
    pub dominant: Option<DominantEigenstate>,
}

impl Snapshot {
    /// Capture the requested observables from `rho`.
    pub fn capture(
        rho: &CMatrix,
        num_qubits: usize,
        sim_time: f64,
        observables: ObservableSet,
    ) -> EngineResult<Self> {
        let bloch = bloch_metrics(rho, num_qubits)?;
        let mutual_info = match observables.mutual_info {
            Some(mode) => mutual_information_all(rho, num_qubits, mode)?,
            None => Vec::new(),
        };
        let dominant = if observables.dominant {
            Some(dominant_eigenstate(rho)?)
        } else {
            None
        };
        Ok(Self {
            sim_time,
            state: PackedState::from_matrix(rho),
            purity: purity(rho),
            bloch,
            mutual_info,
            dominant,
        })
    }

    /// Number of qubits this snapshot describes.
    pub fn num_qubits(&self) -> usize {
        self.bloch.len()
    }
}

impl crate::engine::EvolutionEngine {
    /// Advance and capture in one call, avoiding a boundary round trip when
    /// a caller wants both the evolved state and its observables.
    pub fn evolve_with_observables(
        &self,
        rho: &CMatrix,
        dt: f64,
        max_dt: f64,
        num_qubits: usize,
        sim_time: f64,
        observables: ObservableSet,
    ) -> EngineResult<(CMatrix, Snapshot)> {
        let next = self.evolve(rho, dt, max_dt)?;
        let snap = Snapshot::capture(&next, num_qubits, sim_time, observables)?;
        Ok((next, snap))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use num_complex::Complex64;

    fn mixed_two_qubit() -> CMatrix {
        CMatrix::identity(4).scale(Complex64::new(0.25, 0.0))
    }

    #[test]
    fn capture_full_populates_everything() {
        let snap = Snapshot::capture(&mixed_two_qubit(), 2, 1.5, ObservableSet::FULL).unwrap();
        assert_relative_eq!(snap.sim_time, 1.5);
        assert_relative_eq!(snap.purity, 0.25, epsilon = 1e-12);
        assert_eq!(snap.num_qubits(), 2);
        assert_eq!(snap.mutual_info.len(), 1);
        let dom = snap.dominant.unwrap();
        assert_relative_eq!(dom.eigenvalue, 0.25, epsilon = 1e-9);
    }

    #[test]
    fn capture_cheap_skips_expensive_observables() {
        let snap = Snapshot::capture(&mixed_two_qubit(), 2, 0.0, ObservableSet::CHEAP).unwrap();
        assert!(snap.mutual_info.is_empty());
        assert!(snap.dominant.is_none());
        assert_eq!(snap.bloch.len(), 2);
    }

    #[test]
    fn evolve_with_observables_matches_separate_calls() {
        let mut engine = crate::engine::EvolutionEngine::new(2);
        engine
            .add_lindblad_triplets(&[0.0, 1.0, 1.0, 0.0])
            .unwrap();
        engine.finalize().unwrap();
        let mut rho = CMatrix::zeros(2);
        rho.set(1, 1, Complex64::new(1.0, 0.0));

        let (next, snap) = engine
            .evolve_with_observables(&rho, 0.2, 1e-3, 1, 0.2, ObservableSet::CHEAP)
            .unwrap();
        let separate = engine.evolve(&rho, 0.2, 1e-3).unwrap();
        assert_eq!(next, separate);
        assert_eq!(
            snap,
            Snapshot::capture(&separate, 1, 0.2, ObservableSet::CHEAP).unwrap()
        );
    }

    #[test]
    fn snapshot_roundtrips_through_json() {
        let snap = Snapshot::capture(&mixed_two_qubit(), 2, 3.0, ObservableSet::FULL).unwrap();
        let json = serde_json::to_string(&snap).unwrap();
        let back: Snapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(snap, back);
    }
}
