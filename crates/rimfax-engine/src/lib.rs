//! Lindblad density-matrix evolution and observable extraction.
//!
//! This crate is the numerical core of rimfax: an [`EvolutionEngine`]
//! integrates the Lindblad master equation
//!
//! ```text
//! dρ/dt = −i[H, ρ] + Σₖ (Lₖ ρ Lₖ† − ½{Lₖ†Lₖ, ρ})
//! ```
//!
//! and the [`observables`] module turns the evolved ρ into what a consumer
//! actually renders: purity, per-qubit Bloch coordinates, pairwise mutual
//! information, and the dominant eigenstate. [`Snapshot`] bundles one
//! instant of all of it behind a serde boundary.
//!
//! # Quick start
//!
//! ```
//! use num_complex::Complex64;
//! use rimfax_engine::{EvolutionEngine, ObservableSet, Snapshot};
//! use rimfax_math::CMatrix;
//!
//! # fn main() -> rimfax_engine::EngineResult<()> {
//! let mut engine = EvolutionEngine::new(2);
//! // Amplitude damping at rate 0.5: L = √0.5 σ⁻.
//! engine.add_lindblad_triplets(&[0.0, 1.0, 0.5f64.sqrt(), 0.0])?;
//! engine.finalize()?;
//!
//! let mut rho = CMatrix::zeros(2);
//! rho.set(1, 1, Complex64::new(1.0, 0.0)); // start excited
//! rho = engine.evolve(&rho, 1.0, 1e-3)?;
//!
//! let snap = Snapshot::capture(&rho, 1, 1.0, ObservableSet::CHEAP)?;
//! assert!(snap.bloch[0].p0 > 0.3); // decayed toward ground
//! # Ok(())
//! # }
//! ```

pub mod engine;
pub mod error;
pub mod observables;
pub mod snapshot;

pub use engine::{EulerIntegrator, EvolutionEngine, Integrator};
pub use error::{EngineError, EngineResult};
pub use observables::{
    BlochQubit, DominantEigenstate, MiMode, bloch_metrics, bloch_packet, cos2_overlap,
    dominant_eigenstate, mutual_information_all, partial_trace_pair, partial_trace_single, purity,
    von_neumann_entropy,
};
pub use snapshot::{ObservableSet, Snapshot};
