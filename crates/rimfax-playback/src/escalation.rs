//! Adaptive refill sizing on a Fibonacci ladder.
//!
//! Each refill produces `LADDER[level]` lookahead steps. Refilling while the
//! buffer is under pressure means the previous batch was too small, so the
//! level climbs one rung; a sustained run of relaxed refills steps it back
//! down. Fibonacci spacing grows batches fast enough to catch a slow
//! producer without doubling past the sweet spot.

/// Batch sizes by escalation level.
const LADDER: [usize; 8] = [1, 2, 3, 5, 8, 13, 21, 34];

/// Relaxed refills required before de-escalating one rung.
const DEFAULT_DECAY_AFTER: u32 = 4;

#[derive(Debug, Clone)]
pub struct EscalationLadder {
    level: usize,
    ceiling: usize,
    floor: usize,
    healthy_streak: u32,
    decay_after: u32,
}

impl Default for EscalationLadder {
    fn default() -> Self {
        Self::new(LADDER.len() - 1)
    }
}

impl EscalationLadder {
    /// Ladder starting at the bottom with the given ceiling level
    /// (clamped to the top rung).
    pub fn new(ceiling: usize) -> Self {
        Self {
            level: 0,
            ceiling: ceiling.min(LADDER.len() - 1),
            floor: 0,
            healthy_streak: 0,
            decay_after: DEFAULT_DECAY_AFTER,
        }
    }

    /// Keep de-escalation from dropping below `floor`.
    pub fn with_floor(mut self, floor: usize) -> Self {
        self.floor = floor.min(self.ceiling);
        self.level = self.level.max(self.floor);
        self
    }

    /// Relaxed refills required before stepping down a rung.
    pub fn with_decay_after(mut self, decay_after: u32) -> Self {
        self.decay_after = decay_after.max(1);
        self
    }

    /// Current rung.
    pub fn level(&self) -> usize {
        self.level
    }

    /// Lookahead steps the next refill should produce.
    pub fn steps(&self) -> usize {
        LADDER[self.level]
    }

    /// Record a refill, escalating if the buffer was under pressure when it
    /// was requested and de-escalating after a healthy run.
    pub fn on_refill(&mut self, under_pressure: bool) {
        if under_pressure {
            self.healthy_streak = 0;
            if self.level < self.ceiling {
                self.level += 1;
                tracing::debug!(level = self.level, steps = self.steps(), "refill escalated");
            }
        } else {
            self.healthy_streak += 1;
            if self.healthy_streak >= self.decay_after && self.level > self.floor {
                self.level -= 1;
                self.healthy_streak = 0;
                tracing::debug!(level = self.level, steps = self.steps(), "refill relaxed");
            }
        }
    }

    /// Jump straight up one rung, e.g. after an invalidation wiped the
    /// buffer and the next refill must cover the gap.
    pub fn escalate(&mut self) {
        self.on_refill(true);
    }
}
