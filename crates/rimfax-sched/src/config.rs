//! Declarative subsystem configuration.

use rimfax_math::PackedState;
use serde::{Deserialize, Serialize};

use crate::error::{SchedError, SchedResult};

/// Everything needed to build one subsystem's evolution engine.
///
/// Operators arrive in boundary form: the Hamiltonian as a flat-packed dense
/// matrix, Lindblad operators as `[row, col, re, im]*` triplet streams. The
/// registry validates and builds, so a bad config never produces a half-wired
/// engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubsystemConfig {
    /// Human-readable unique name.
    pub name: String,
    /// Number of qubits; state dimension is `2^num_qubits`.
    pub num_qubits: usize,
    /// Optional Hamiltonian in packed wire form.
    #[serde(default)]
    pub hamiltonian: Option<PackedState>,
    /// Lindblad operators, each a `[row, col, re, im]*` triplet stream.
    #[serde(default)]
    pub lindblad_triplets: Vec<Vec<f64>>,
    /// Initial state; defaults to the maximally mixed state.
    #[serde(default)]
    pub initial_state: Option<PackedState>,
}

impl SubsystemConfig {
    /// New config for a bare `num_qubits`-qubit subsystem.
    pub fn new(name: impl Into<String>, num_qubits: usize) -> Self {
        Self {
            name: name.into(),
            num_qubits,
            hamiltonian: None,
            lindblad_triplets: Vec::new(),
            initial_state: None,
        }
    }

    /// State dimension, `2^num_qubits`.
    pub fn dim(&self) -> usize {
        1usize << self.num_qubits
    }

    /// Check internal consistency without building anything.
    pub fn validate(&self) -> SchedResult<()> {
        if self.name.is_empty() {
            return Err(self.invalid("name is empty"));
        }
        if self.num_qubits == 0 || self.num_qubits >= usize::BITS as usize {
            return Err(self.invalid(format!("unsupported qubit count {}", self.num_qubits)));
        }
        let dim = self.dim();
        if let Some(h) = &self.hamiltonian {
            if h.dim != dim || h.data.len() != dim * dim * 2 {
                return Err(self.invalid(format!(
                    "hamiltonian is {}-dim with {} values, expected {}-dim with {}",
                    h.dim,
                    h.data.len(),
                    dim,
                    dim * dim * 2
                )));
            }
        }
        for (k, triplets) in self.lindblad_triplets.iter().enumerate() {
            if triplets.len() % 4 != 0 {
                return Err(self.invalid(format!(
                    "lindblad operator {k} has {} values, not a multiple of 4",
                    triplets.len()
                )));
            }
        }
        if let Some(init) = &self.initial_state {
            if init.dim != dim {
                return Err(self.invalid(format!(
                    "initial state dim {} does not match {}",
                    init.dim, dim
                )));
            }
        }
        Ok(())
    }

    fn invalid(&self, reason: impl Into<String>) -> SchedError {
        SchedError::InvalidConfig {
            name: self.name.clone(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_validates() {
        assert!(SubsystemConfig::new("cavity", 2).validate().is_ok());
    }

    #[test]
    fn bad_hamiltonian_length_is_rejected() {
        let mut cfg = SubsystemConfig::new("cavity", 1);
        cfg.hamiltonian = Some(PackedState {
            dim: 2,
            data: vec![0.0; 7],
        });
        assert!(matches!(
            cfg.validate(),
            Err(SchedError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn zero_qubits_is_rejected() {
        assert!(SubsystemConfig::new("null", 0).validate().is_err());
    }

    #[test]
    fn ragged_triplets_are_rejected() {
        let mut cfg = SubsystemConfig::new("cavity", 1);
        cfg.lindblad_triplets = vec![vec![0.0, 1.0, 1.0]];
        assert!(cfg.validate().is_err());
    }
}
