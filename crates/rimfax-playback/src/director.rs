//! The playback director: one facade tying registry, buffers, and ladders
//! together.
//!
//! Two clocks drive it. `tick_physics` runs on the simulation cadence: when
//! any subsystem's buffer is shallow it runs a single batched lookahead call
//! and distributes the resulting tracks into per-subsystem ring buffers,
//! sized by each subsystem's escalation ladder. `tick_render` runs on the
//! frame cadence and only moves read cursors, so a render loop never waits
//! on the integrator.

use rimfax_engine::{ObservableSet, Snapshot};
use rimfax_sched::{SubsystemConfig, SubsystemId, SubsystemRegistry};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::buffer::{BufferState, SnapshotBuffer};
use crate::error::{PlaybackError, PlaybackResult};
use crate::escalation::EscalationLadder;

/// Tunables for the playback loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectorConfig {
    /// Simulated seconds per lookahead step.
    pub step_dt: f64,
    /// Integrator sub-step cap passed through to every engine.
    pub max_dt: f64,
    /// Simulated seconds consumed per wall-clock second.
    pub playback_rate: f64,
    /// Snapshots required before a subsystem's playback starts.
    pub start_threshold: usize,
    /// Queue depth at or below which a refill is requested.
    pub low_water: usize,
    /// Highest escalation rung the refill ladders may climb to.
    pub escalation_ceiling: usize,
    /// Observables captured into every snapshot.
    pub observables: ObservableSet,
}

impl Default for DirectorConfig {
    fn default() -> Self {
        Self {
            step_dt: 0.1,
            max_dt: 1e-3,
            playback_rate: 1.0,
            start_threshold: 2,
            low_water: 2,
            escalation_ceiling: 7,
            observables: ObservableSet::FULL,
        }
    }
}

/// One subsystem's playback side: its ring buffer and refill ladder.
struct PlaybackSlot {
    buffer: SnapshotBuffer<Snapshot>,
    ladder: EscalationLadder,
}

/// Facade over registry + per-subsystem buffers + escalation ladders.
pub struct Director {
    registry: SubsystemRegistry,
    slots: FxHashMap<SubsystemId, PlaybackSlot>,
    config: DirectorConfig,
    flushing: bool,
}

impl Director {
    pub fn new(config: DirectorConfig) -> Self {
        Self {
            registry: SubsystemRegistry::new(),
            slots: FxHashMap::default(),
            config,
            flushing: false,
        }
    }

    /// Direct access to the registry, e.g. for name lookups.
    pub fn registry(&self) -> &SubsystemRegistry {
        &self.registry
    }

    /// Buffer lifecycle state for one subsystem.
    pub fn buffer_state(&self, id: SubsystemId) -> PlaybackResult<BufferState> {
        Ok(self.slot(id)?.buffer.state())
    }

    /// Queued snapshots not yet shown for one subsystem.
    pub fn buffered_snapshots(&self, id: SubsystemId) -> PlaybackResult<usize> {
        Ok(self.slot(id)?.buffer.len())
    }

    /// Lookahead steps this subsystem's next refill will request.
    pub fn refill_steps(&self, id: SubsystemId) -> PlaybackResult<usize> {
        Ok(self.slot(id)?.ladder.steps())
    }

    /// Add a subsystem with a fresh (empty) playback buffer.
    pub fn register(&mut self, config: SubsystemConfig) -> PlaybackResult<SubsystemId> {
        let id = self.registry.register(config)?;
        self.slots.insert(
            id,
            PlaybackSlot {
                buffer: SnapshotBuffer::new(self.config.start_threshold, self.config.low_water),
                ladder: EscalationLadder::new(self.config.escalation_ceiling),
            },
        );
        Ok(id)
    }

    /// Remove a subsystem, discarding its buffer. A lookahead track that
    /// arrives for a freed slot afterwards is dropped silently.
    pub fn unregister(&mut self, id: SubsystemId) -> PlaybackResult<()> {
        self.registry.unregister(id)?;
        self.slots.remove(&id);
        Ok(())
    }

    /// Freeze or thaw one subsystem. Takes effect at the next refill;
    /// already-buffered snapshots play out as produced.
    pub fn set_observer_active(&mut self, id: SubsystemId, active: bool) -> PlaybackResult<()> {
        self.registry.set_active(id, active)?;
        Ok(())
    }

    /// External invalidation: wipe the queue (keeping the shown snapshot)
    /// and escalate so the next refill covers the gap.
    pub fn invalidate(&mut self, id: SubsystemId) -> PlaybackResult<()> {
        let slot = self
            .slots
            .get_mut(&id)
            .ok_or(PlaybackError::Sched(rimfax_sched::SchedError::UnknownSubsystem(id)))?;
        slot.buffer.invalidate();
        slot.ladder.escalate();
        tracing::debug!(%id, steps = slot.ladder.steps(), "buffer invalidated");
        Ok(())
    }

    /// Last-known snapshot for a subsystem. Never blocks: before playback
    /// starts it shows the oldest queued snapshot (where playback will
    /// begin, so the shown sim_time never moves backwards), and only falls
    /// back to the registry's most recent capture when nothing is queued
    /// at all.
    pub fn current_snapshot(&self, id: SubsystemId) -> Option<&Snapshot> {
        if let Some(slot) = self.slots.get(&id) {
            if let Some(snap) = slot.buffer.current() {
                return Some(snap);
            }
            if let Some(snap) = slot.buffer.oldest() {
                return Some(snap);
            }
        }
        self.registry.last_snapshot(id).ok().flatten()
    }

    /// Render-cadence tick: advance every subsystem's playback by
    /// `dt_wallclock` seconds. Pure cursor movement, no simulation.
    pub fn tick_render(&mut self, dt_wallclock: f64) {
        let frames = dt_wallclock.max(0.0) * self.config.playback_rate / self.config.step_dt;
        for slot in self.slots.values_mut() {
            slot.buffer.advance(frames);
        }
    }

    /// Simulation-cadence tick: the single CPU-bound call.
    ///
    /// If any buffer is shallow, runs one batched lookahead sized by the
    /// deepest ladder among the shallow subsystems and distributes every
    /// track into its subsystem's buffer (evolution advances all of them, so
    /// no track is discarded). Duplicate refill needs coalesce into this one
    /// call. Returns the number of steps produced, 0 when no refill ran.
    pub fn tick_physics(&mut self) -> PlaybackResult<usize> {
        if self.flushing || self.registry.is_empty() {
            return Ok(0);
        }
        let mut steps = 0usize;
        for id in self.registry.ids() {
            if let Some(slot) = self.slots.get(id) {
                if slot.buffer.under_pressure() {
                    steps = steps.max(slot.ladder.steps());
                }
            }
        }
        if steps == 0 {
            return Ok(0);
        }

        let batch = self.registry.evolve_all_lookahead(
            steps,
            self.config.step_dt,
            self.config.max_dt,
            self.config.observables,
        )?;
        for track in batch.tracks {
            // A track for a just-unregistered subsystem lands nowhere.
            let Some(slot) = self.slots.get_mut(&track.id) else {
                continue;
            };
            let pressured = slot.buffer.under_pressure();
            let underran = slot.buffer.take_underrun();
            if underran {
                tracing::warn!(
                    id = %track.id,
                    buffered = slot.buffer.len(),
                    "playback underrun, escalating refill"
                );
            }
            slot.buffer.push(track.snapshots);
            if pressured {
                slot.ladder.on_refill(underran);
            }
        }
        tracing::debug!(steps, "lookahead refill complete");
        Ok(steps)
    }

    /// Stop refilling and let every buffer play out.
    pub fn begin_flush(&mut self) {
        self.flushing = true;
        for slot in self.slots.values_mut() {
            slot.buffer.begin_flush();
        }
    }

    fn slot(&self, id: SubsystemId) -> PlaybackResult<&PlaybackSlot> {
        self.slots
            .get(&id)
            .ok_or(PlaybackError::Sched(rimfax_sched::SchedError::UnknownSubsystem(id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decay_config(name: &str) -> SubsystemConfig {
        let mut cfg = SubsystemConfig::new(name, 1);
        cfg.lindblad_triplets = vec![vec![0.0, 1.0, 1.0, 0.0]];
        cfg
    }

    fn cheap_director() -> Director {
        Director::new(DirectorConfig {
            observables: ObservableSet::CHEAP,
            ..DirectorConfig::default()
        })
    }

    #[test]
    fn physics_tick_is_a_noop_with_nothing_registered() {
        let mut director = cheap_director();
        assert_eq!(director.tick_physics().unwrap(), 0);
    }

    #[test]
    fn render_before_first_batch_shows_nothing() {
        let mut director = cheap_director();
        let id = director.register(decay_config("a")).unwrap();
        director.tick_render(0.1);
        assert!(director.current_snapshot(id).is_none());
        assert_eq!(director.buffer_state(id).unwrap(), BufferState::Empty);
    }

    #[test]
    fn refill_then_render_advances_playback() {
        let mut director = cheap_director();
        let id = director.register(decay_config("a")).unwrap();

        let produced = director.tick_physics().unwrap();
        assert!(produced >= 1);
        director.tick_render(0.0);
        let t0 = director.current_snapshot(id).unwrap().sim_time;

        // Need at least two buffered snapshots to observe movement.
        director.tick_physics().unwrap();
        director.tick_render(0.1);
        let t1 = director.current_snapshot(id).unwrap().sim_time;
        assert!(t1 >= t0);
    }

    #[test]
    fn deep_buffer_skips_refill() {
        let mut director = cheap_director();
        let id = director.register(decay_config("a")).unwrap();
        while director.tick_physics().unwrap() > 0 {
            if director.buffered_snapshots(id).unwrap() > director.config.low_water {
                break;
            }
        }
        assert_eq!(director.tick_physics().unwrap(), 0);
    }

    #[test]
    fn underrun_escalates_that_subsystems_ladder() {
        let mut director = cheap_director();
        let id = director.register(decay_config("a")).unwrap();
        while director.tick_physics().unwrap() > 0 {}
        let steps_before = director.refill_steps(id).unwrap();

        // Consume far more than was buffered.
        director.tick_render(100.0);
        assert!(director.current_snapshot(id).is_some()); // held, not dropped
        director.tick_physics().unwrap();
        assert!(director.refill_steps(id).unwrap() > steps_before);
    }

    #[test]
    fn invalidation_restarts_from_empty_with_escalation() {
        let mut director = cheap_director();
        let id = director.register(decay_config("a")).unwrap();
        while director.tick_physics().unwrap() > 0 {}
        director.tick_render(0.0);
        let shown = director.current_snapshot(id).unwrap().sim_time;
        let steps_before = director.refill_steps(id).unwrap();

        director.invalidate(id).unwrap();
        assert_eq!(director.buffer_state(id).unwrap(), BufferState::Empty);
        // Shown snapshot survives; the ladder climbed.
        assert_eq!(director.current_snapshot(id).unwrap().sim_time, shown);
        assert!(director.refill_steps(id).unwrap() > steps_before);
    }

    #[test]
    fn shown_time_is_monotone_while_buffer_fills() {
        // With a high start threshold the first refills leave the buffer in
        // Filling; the shown snapshot must already be the oldest queued one,
        // not the newest capture, or playback would start with a rewind.
        let mut director = Director::new(DirectorConfig {
            observables: ObservableSet::CHEAP,
            start_threshold: 4,
            ..DirectorConfig::default()
        });
        let id = director.register(decay_config("a")).unwrap();

        let mut last = f64::NEG_INFINITY;
        for _ in 0..12 {
            director.tick_physics().unwrap();
            director.tick_render(0.05);
            if let Some(snap) = director.current_snapshot(id) {
                assert!(
                    snap.sim_time >= last,
                    "shown sim_time went backwards: {} after {}",
                    snap.sim_time,
                    last
                );
                last = snap.sim_time;
            }
        }
        assert!(last > 0.0);
    }

    #[test]
    fn director_config_roundtrips_through_json() {
        let config = DirectorConfig {
            step_dt: 0.05,
            start_threshold: 4,
            ..DirectorConfig::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let back: DirectorConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn unregister_discards_buffer_and_handle() {
        let mut director = cheap_director();
        let a = director.register(decay_config("a")).unwrap();
        let b = director.register(decay_config("b")).unwrap();
        director.tick_physics().unwrap();
        director.unregister(a).unwrap();

        assert!(director.buffer_state(a).is_err());
        assert!(director.current_snapshot(a).is_none());
        assert!(director.buffer_state(b).is_ok());
        assert!(director.tick_physics().is_ok());
    }

    #[test]
    fn inactive_subsystem_is_echoed_frozen() {
        let mut director = cheap_director();
        let a = director.register(decay_config("a")).unwrap();
        let b = director.register(decay_config("b")).unwrap();
        director.set_observer_active(b, false).unwrap();

        for _ in 0..3 {
            director.tick_physics().unwrap();
        }
        director.tick_render(0.0);
        let (t_a0, t_b0) = (
            director.current_snapshot(a).unwrap().sim_time,
            director.current_snapshot(b).unwrap().sim_time,
        );
        director.tick_render(0.2);
        assert!(director.current_snapshot(a).unwrap().sim_time > t_a0);
        assert_eq!(director.current_snapshot(b).unwrap().sim_time, t_b0);
    }
}
