//! Lindblad master-equation evolution.
//!
//! Each [`EvolutionEngine`] owns one subsystem's fixed Hamiltonian and
//! Lindblad channel set and advances a density matrix under
//!
//!   dρ/dt = -i[H, ρ] + Σ_k (L_k ρ L_k† − ½{L_k†L_k, ρ})
//!
//! Configuration is two-phase: operators are added, then `finalize()` caches
//! `L_k†` and `L_k†L_k` per channel. An unfinalized engine evolves nothing —
//! `step`/`evolve` return the input unchanged rather than erroring, so callers
//! that care must check [`EvolutionEngine::is_finalized`].
//!
//! Trace and diagonal drift are clamped once per `evolve` call, after all
//! sub-steps; the correction is silent by design.

use num_complex::Complex64;
use rimfax_math::{CMatrix, SparseMatrix};

use crate::error::{EngineError, EngineResult};

/// Integration strategy advancing ρ by one sub-step.
///
/// The derivative closure evaluates the Liouvillian at an arbitrary state,
/// which is all a higher-order scheme (midpoint, RK4) would need.
pub trait Integrator: std::fmt::Debug + Send {
    /// Advance `rho` by `dt` given the state derivative.
    fn advance(
        &self,
        deriv: &dyn Fn(&CMatrix) -> EngineResult<CMatrix>,
        rho: &CMatrix,
        dt: f64,
    ) -> EngineResult<CMatrix>;
}

/// Forward Euler: `ρ' = ρ + dt·dρ`. Cheap, needs small sub-steps.
#[derive(Debug, Default, Clone, Copy)]
pub struct EulerIntegrator;

impl Integrator for EulerIntegrator {
    fn advance(
        &self,
        deriv: &dyn Fn(&CMatrix) -> EngineResult<CMatrix>,
        rho: &CMatrix,
        dt: f64,
    ) -> EngineResult<CMatrix> {
        let drho = deriv(rho)?;
        let mut next = rho.clone();
        next.add_scaled_assign(&drho, Complex64::new(dt, 0.0))?;
        Ok(next)
    }
}

/// One dissipative channel with its finalize-time caches.
#[derive(Debug, Clone)]
struct Channel {
    op: SparseMatrix,
    op_dag: SparseMatrix,
    ldag_l: SparseMatrix,
}

/// Per-subsystem Lindblad evolution engine.
#[derive(Debug)]
pub struct EvolutionEngine {
    dim: usize,
    hamiltonian: Option<CMatrix>,
    lindblads: Vec<SparseMatrix>,
    channels: Vec<Channel>,
    finalized: bool,
    integrator: Box<dyn Integrator>,
}

impl EvolutionEngine {
    /// New engine for states of the given dimension, with the default Euler
    /// integrator.
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            hamiltonian: None,
            lindblads: Vec::new(),
            channels: Vec::new(),
            finalized: false,
            integrator: Box::new(EulerIntegrator),
        }
    }

    /// Replace the integration strategy.
    pub fn with_integrator(mut self, integrator: Box<dyn Integrator>) -> Self {
        self.integrator = integrator;
        self
    }

    /// State dimension this engine evolves.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of dissipative channels configured.
    pub fn lindblad_count(&self) -> usize {
        self.lindblads.len()
    }

    /// True once `finalize()` has cached the channel operators.
    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Install the Hamiltonian. Un-finalizes the engine.
    pub fn set_hamiltonian(&mut self, h: CMatrix) -> EngineResult<()> {
        if h.dim() != self.dim {
            return Err(EngineError::DimensionMismatch {
                expected: self.dim,
                got: h.dim(),
            });
        }
        self.hamiltonian = Some(h);
        self.finalized = false;
        Ok(())
    }

    /// Add one Lindblad operator. Un-finalizes the engine.
    pub fn add_lindblad(&mut self, op: SparseMatrix) -> EngineResult<()> {
        if op.dim() != self.dim {
            return Err(EngineError::DimensionMismatch {
                expected: self.dim,
                got: op.dim(),
            });
        }
        self.lindblads.push(op);
        self.finalized = false;
        Ok(())
    }

    /// Add one Lindblad operator from a flat `[row, col, re, im]*` stream.
    pub fn add_lindblad_triplets(&mut self, triplets: &[f64]) -> EngineResult<()> {
        let op = SparseMatrix::from_triplets(triplets, self.dim)?;
        self.add_lindblad(op)
    }

    /// Drop the Hamiltonian and all channels.
    pub fn clear_operators(&mut self) {
        self.hamiltonian = None;
        self.lindblads.clear();
        self.channels.clear();
        self.finalized = false;
    }

    /// Cache `L†` and `L†L` for every channel; required before evolution.
    pub fn finalize(&mut self) -> EngineResult<()> {
        self.channels.clear();
        self.channels.reserve(self.lindblads.len());
        for op in &self.lindblads {
            let op_dag = op.adjoint();
            let ldag_l = op_dag.matmul(op)?;
            self.channels.push(Channel {
                op: op.clone(),
                op_dag,
                ldag_l,
            });
        }
        self.finalized = true;
        tracing::debug!(
            dim = self.dim,
            channels = self.channels.len(),
            has_hamiltonian = self.hamiltonian.is_some(),
            "engine finalized"
        );
        Ok(())
    }

    /// Right-hand side of the master equation, `dρ/dt`.
    pub fn liouvillian(&self, rho: &CMatrix) -> EngineResult<CMatrix> {
        let mut drho = CMatrix::zeros(self.dim);

        if let Some(h) = &self.hamiltonian {
            // -i[H, ρ]
            let comm = h.commutator(rho)?;
            drho.add_scaled_assign(&comm, Complex64::new(0.0, -1.0))?;
        }

        for ch in &self.channels {
            // L ρ L† (sparse × dense, then dense × sparse)
            let l_rho = ch.op.mul_dense(rho)?;
            let l_rho_ldag = ch.op_dag.dense_mul(&l_rho)?;
            // {L†L, ρ}
            let a = ch.ldag_l.mul_dense(rho)?;
            let b = ch.ldag_l.dense_mul(rho)?;

            drho.add_scaled_assign(&l_rho_ldag, Complex64::new(1.0, 0.0))?;
            drho.add_scaled_assign(&a, Complex64::new(-0.5, 0.0))?;
            drho.add_scaled_assign(&b, Complex64::new(-0.5, 0.0))?;
        }

        Ok(drho)
    }

    /// One integrator sub-step, without clamping.
    ///
    /// Unfinalized engines return the input unchanged.
    pub fn step(&self, rho: &CMatrix, dt: f64) -> EngineResult<CMatrix> {
        if !self.finalized {
            return Ok(rho.clone());
        }
        self.check_state(rho)?;
        self.integrator
            .advance(&|r| self.liouvillian(r), rho, dt)
    }

    /// Advance ρ by `dt`, subdividing into `ceil(dt / max_dt)` sub-steps for
    /// stability, then clamp trace and diagonal once.
    ///
    /// Unfinalized engines return the input unchanged.
    pub fn evolve(&self, rho: &CMatrix, dt: f64, max_dt: f64) -> EngineResult<CMatrix> {
        if !self.finalized {
            return Ok(rho.clone());
        }
        self.check_state(rho)?;

        let n_steps = if max_dt > 0.0 && dt > max_dt {
            (dt / max_dt).ceil() as usize
        } else {
            1
        };
        let sub_dt = dt / n_steps as f64;

        let mut state = rho.clone();
        for _ in 0..n_steps {
            state = self
                .integrator
                .advance(&|r| self.liouvillian(r), &state, sub_dt)?;
        }
        clamp_state(&mut state);
        Ok(state)
    }

    fn check_state(&self, rho: &CMatrix) -> EngineResult<()> {
        if rho.dim() != self.dim {
            return Err(EngineError::DimensionMismatch {
                expected: self.dim,
                got: rho.dim(),
            });
        }
        Ok(())
    }
}

/// Silent drift correction: renormalize trace, then clamp the diagonal to
/// real values in [0, 1].
fn clamp_state(rho: &mut CMatrix) {
    let d = rho.dim();
    let tr = rho.trace();
    if tr.norm() > 1e-10 {
        let inv = Complex64::new(1.0, 0.0) / tr;
        for i in 0..d {
            for j in 0..d {
                let v = rho.get(i, j);
                rho.set(i, j, v * inv);
            }
        }
    }
    for i in 0..d {
        let v = rho.get(i, i);
        rho.set(i, i, Complex64::new(v.re.clamp(0.0, 1.0), 0.0));
    }
}
