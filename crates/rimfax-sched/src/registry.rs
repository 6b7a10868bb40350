//! Subsystem registry and lookahead batch evolution.
//!
//! The registry owns every live subsystem: its finalized engine, current
//! state, and last published snapshot. Handles are generational in spirit —
//! IDs are never reused, so a stale handle to an unregistered subsystem
//! resolves to [`SchedError::UnknownSubsystem`] instead of a stranger.

use num_complex::Complex64;
use rimfax_engine::{EvolutionEngine, ObservableSet, Snapshot};
use rimfax_math::CMatrix;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::config::SubsystemConfig;
use crate::error::{SchedError, SchedResult};

/// Opaque handle to a registered subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubsystemId(u64);

impl std::fmt::Display for SubsystemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "subsystem#{}", self.0)
    }
}

struct Slot {
    id: SubsystemId,
    name: String,
    num_qubits: usize,
    engine: EvolutionEngine,
    state: CMatrix,
    sim_time: f64,
    active: bool,
    last_snapshot: Option<Snapshot>,
}

/// One subsystem's column of a lookahead batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubsystemTrack {
    /// Which subsystem this track belongs to.
    pub id: SubsystemId,
    /// Its registered name.
    pub name: String,
    /// One snapshot per lookahead step, oldest first.
    pub snapshots: Vec<Snapshot>,
}

/// Result of one lookahead call: `steps` future snapshots for every
/// subsystem, in registration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookaheadBatch {
    /// Steps per track.
    pub steps: usize,
    /// Tracks in registration order.
    pub tracks: Vec<SubsystemTrack>,
}

/// Registry of live subsystems with slot-reusing storage.
#[derive(Default)]
pub struct SubsystemRegistry {
    slots: Vec<Option<Slot>>,
    index: FxHashMap<SubsystemId, usize>,
    names: FxHashMap<String, SubsystemId>,
    order: Vec<SubsystemId>,
    next_id: u64,
}

impl SubsystemRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live subsystems.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// True when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// IDs in registration order. Lookahead batches follow this order.
    pub fn ids(&self) -> &[SubsystemId] {
        &self.order
    }

    /// Build, finalize, and install a subsystem from its config.
    ///
    /// The initial state defaults to the maximally mixed state. Freed slots
    /// are reused, but IDs never are.
    pub fn register(&mut self, config: SubsystemConfig) -> SchedResult<SubsystemId> {
        config.validate()?;
        if self.names.contains_key(&config.name) {
            return Err(SchedError::DuplicateName(config.name));
        }

        let dim = config.dim();
        let mut engine = EvolutionEngine::new(dim);
        if let Some(packed) = &config.hamiltonian {
            engine.set_hamiltonian(packed.to_matrix()?)?;
        }
        for triplets in &config.lindblad_triplets {
            engine.add_lindblad_triplets(triplets)?;
        }
        engine.finalize()?;

        let state = match &config.initial_state {
            Some(packed) => packed.to_matrix()?,
            None => maximally_mixed(dim),
        };

        let id = SubsystemId(self.next_id);
        self.next_id += 1;
        let slot = Slot {
            id,
            name: config.name.clone(),
            num_qubits: config.num_qubits,
            engine,
            state,
            sim_time: 0.0,
            active: true,
            last_snapshot: None,
        };

        let slot_idx = match self.slots.iter().position(Option::is_none) {
            Some(i) => {
                self.slots[i] = Some(slot);
                i
            }
            None => {
                self.slots.push(Some(slot));
                self.slots.len() - 1
            }
        };
        self.index.insert(id, slot_idx);
        self.names.insert(config.name.clone(), id);
        self.order.push(id);

        tracing::info!(
            %id,
            name = %config.name,
            num_qubits = config.num_qubits,
            channels = config.lindblad_triplets.len(),
            "subsystem registered"
        );
        Ok(id)
    }

    /// Remove a subsystem, freeing its slot for reuse.
    pub fn unregister(&mut self, id: SubsystemId) -> SchedResult<()> {
        let slot_idx = self
            .index
            .remove(&id)
            .ok_or(SchedError::UnknownSubsystem(id))?;
        if let Some(slot) = self.slots[slot_idx].take() {
            self.names.remove(&slot.name);
            tracing::info!(%id, name = %slot.name, "subsystem unregistered");
        }
        self.order.retain(|&x| x != id);
        Ok(())
    }

    /// Look a subsystem up by name.
    pub fn id_of(&self, name: &str) -> Option<SubsystemId> {
        self.names.get(name).copied()
    }

    /// Mark a subsystem active or inactive.
    ///
    /// Inactive subsystems keep their state frozen and echo their last
    /// snapshot through lookahead batches.
    pub fn set_active(&mut self, id: SubsystemId, active: bool) -> SchedResult<()> {
        self.slot_mut(id)?.active = active;
        Ok(())
    }

    /// Whether the subsystem participates in batch evolution.
    pub fn is_active(&self, id: SubsystemId) -> SchedResult<bool> {
        Ok(self.slot(id)?.active)
    }

    /// Current simulation time of one subsystem.
    pub fn sim_time(&self, id: SubsystemId) -> SchedResult<f64> {
        Ok(self.slot(id)?.sim_time)
    }

    /// Last snapshot published for this subsystem, if any.
    pub fn last_snapshot(&self, id: SubsystemId) -> SchedResult<Option<&Snapshot>> {
        Ok(self.slot(id)?.last_snapshot.as_ref())
    }

    /// Overwrite a subsystem's state, e.g. after an external reset.
    pub fn set_state(&mut self, id: SubsystemId, state: CMatrix) -> SchedResult<()> {
        let slot = self.slot_mut(id)?;
        if state.dim() != slot.engine.dim() {
            return Err(SchedError::Engine(
                rimfax_engine::EngineError::DimensionMismatch {
                    expected: slot.engine.dim(),
                    got: state.dim(),
                },
            ));
        }
        slot.state = state;
        slot.last_snapshot = None;
        Ok(())
    }

    /// Advance one subsystem by `dt` and capture a snapshot.
    pub fn evolve_single(
        &mut self,
        id: SubsystemId,
        dt: f64,
        max_dt: f64,
        observables: ObservableSet,
    ) -> SchedResult<Snapshot> {
        let slot = self.slot_mut(id)?;
        advance_slot(slot, dt, max_dt, observables)
    }

    /// Evolve every subsystem `steps` steps of `dt` ahead, capturing a
    /// snapshot per step.
    ///
    /// Subsystems are processed in registration order. Inactive subsystems
    /// do not evolve; their track echoes the last known snapshot at each
    /// step so consumers always see a full-width batch.
    pub fn evolve_all_lookahead(
        &mut self,
        steps: usize,
        dt: f64,
        max_dt: f64,
        observables: ObservableSet,
    ) -> SchedResult<LookaheadBatch> {
        let order = self.order.clone();
        let mut tracks = Vec::with_capacity(order.len());
        for id in order {
            let slot_idx = self
                .index
                .get(&id)
                .copied()
                .ok_or(SchedError::UnknownSubsystem(id))?;
            let slot = self.slots[slot_idx]
                .as_mut()
                .ok_or(SchedError::UnknownSubsystem(id))?;

            let mut snapshots = Vec::with_capacity(steps);
            if slot.active {
                for _ in 0..steps {
                    snapshots.push(advance_slot(slot, dt, max_dt, observables)?);
                }
            } else {
                // Frozen: publish the last state without advancing time.
                let held = match &slot.last_snapshot {
                    Some(snap) => snap.clone(),
                    None => {
                        let snap = Snapshot::capture(
                            &slot.state,
                            slot.num_qubits,
                            slot.sim_time,
                            observables,
                        )?;
                        slot.last_snapshot = Some(snap.clone());
                        snap
                    }
                };
                snapshots.resize(steps, held);
            }
            tracks.push(SubsystemTrack {
                id: slot.id,
                name: slot.name.clone(),
                snapshots,
            });
        }
        tracing::debug!(steps, tracks = tracks.len(), "lookahead batch complete");
        Ok(LookaheadBatch { steps, tracks })
    }

    fn slot(&self, id: SubsystemId) -> SchedResult<&Slot> {
        self.index
            .get(&id)
            .and_then(|&i| self.slots[i].as_ref())
            .ok_or(SchedError::UnknownSubsystem(id))
    }

    fn slot_mut(&mut self, id: SubsystemId) -> SchedResult<&mut Slot> {
        let idx = *self
            .index
            .get(&id)
            .ok_or(SchedError::UnknownSubsystem(id))?;
        self.slots[idx]
            .as_mut()
            .ok_or(SchedError::UnknownSubsystem(id))
    }
}

fn advance_slot(
    slot: &mut Slot,
    dt: f64,
    max_dt: f64,
    observables: ObservableSet,
) -> SchedResult<Snapshot> {
    let (next, snap) = slot.engine.evolve_with_observables(
        &slot.state,
        dt,
        max_dt,
        slot.num_qubits,
        slot.sim_time + dt,
        observables,
    )?;
    slot.state = next;
    slot.sim_time += dt;
    slot.last_snapshot = Some(snap.clone());
    Ok(snap)
}

fn maximally_mixed(dim: usize) -> CMatrix {
    CMatrix::identity(dim).scale(Complex64::new(1.0 / dim as f64, 0.0))
}
