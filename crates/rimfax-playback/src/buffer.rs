//! Ring buffer decoupling simulation cadence from render cadence.
//!
//! Producers push whole lookahead batches; the render loop advances a
//! fractional cursor at wall-clock speed. The buffer never blocks and never
//! rewinds: when frames run out it holds the last one, and invalidation
//! keeps the current frame visible while the queue refills.

use std::collections::VecDeque;

/// Consumer-visible lifecycle of the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferState {
    /// No frames have ever been pushed (or the buffer was invalidated).
    Empty,
    /// Frames are accumulating; playback has not started yet.
    Filling,
    /// Normal playback, coverage above the low-water mark.
    Coasting,
    /// Playing back with coverage at or below the low-water mark; a refill
    /// is wanted.
    Draining,
    /// Teardown: consuming the remainder, no further refills will arrive.
    Flushing,
}

/// FIFO of playback frames with a fractional read cursor.
#[derive(Debug)]
pub struct SnapshotBuffer<T> {
    frames: VecDeque<T>,
    current: Option<T>,
    /// Fractional progress toward the next frame, in [0, 1).
    cursor: f64,
    state: BufferState,
    underrun: bool,
    start_threshold: usize,
    low_water: usize,
}

impl<T> SnapshotBuffer<T> {
    /// New buffer that starts playback once `start_threshold` frames are
    /// queued and reports refill pressure at or below `low_water`.
    pub fn new(start_threshold: usize, low_water: usize) -> Self {
        Self {
            frames: VecDeque::new(),
            current: None,
            cursor: 0.0,
            state: BufferState::Empty,
            underrun: false,
            start_threshold: start_threshold.max(1),
            low_water,
        }
    }

    /// Queued frames not yet consumed.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// True when nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Current lifecycle state.
    ///
    /// `Draining` is derived, never stored: a coasting buffer at or below
    /// the low-water mark reports it until a refill restores coverage.
    pub fn state(&self) -> BufferState {
        if self.state == BufferState::Coasting && self.frames.len() <= self.low_water {
            BufferState::Draining
        } else {
            self.state
        }
    }

    /// The frame the consumer should show right now. Survives invalidation
    /// and exhaustion, so a render loop always has something to draw.
    pub fn current(&self) -> Option<&T> {
        self.current.as_ref()
    }

    /// Oldest queued frame — where playback will start (or resume).
    pub fn oldest(&self) -> Option<&T> {
        self.frames.front()
    }

    /// True when the queue is shallow enough that the producer should refill.
    pub fn under_pressure(&self) -> bool {
        match self.state {
            BufferState::Empty | BufferState::Filling => true,
            BufferState::Coasting | BufferState::Draining => {
                self.frames.len() <= self.low_water
            }
            BufferState::Flushing => false,
        }
    }

    /// Append produced frames. Leaves [`BufferState::Flushing`] (a refill
    /// arrived after all), and promotes Filling to Coasting once the start
    /// threshold is met.
    pub fn push(&mut self, produced: impl IntoIterator<Item = T>) {
        self.frames.extend(produced);
        self.state = match self.state {
            BufferState::Empty | BufferState::Filling | BufferState::Flushing
                if self.frames.len() < self.start_threshold =>
            {
                BufferState::Filling
            }
            _ => BufferState::Coasting,
        };
        // Playback starts on the front frame, not one past it.
        if matches!(self.state, BufferState::Coasting) && self.current.is_none() {
            self.current = self.frames.pop_front();
        }
    }

    /// Advance the cursor by `frames` (fractional) and return the frame to
    /// show.
    ///
    /// Playback only consumes in Coasting (including derived Draining) and
    /// Flushing; while Filling the
    /// cursor does not move. On exhaustion the last frame is held and the
    /// cursor saturates, so playback never goes backwards and never skips
    /// past what was produced.
    pub fn advance(&mut self, frames: f64) -> Option<&T> {
        if matches!(self.state, BufferState::Coasting | BufferState::Flushing) {
            self.cursor += frames.max(0.0);
            while self.cursor >= 1.0 {
                match self.frames.pop_front() {
                    Some(frame) => {
                        self.current = Some(frame);
                        self.cursor -= 1.0;
                    }
                    None => {
                        // Underrun: hold the last frame and forget the owed
                        // time, so a later refill resumes without a jump.
                        self.cursor = 0.0;
                        self.underrun = true;
                        break;
                    }
                }
            }
        }
        self.current.as_ref()
    }

    /// True if playback ran out of frames since the last call; clears the
    /// flag. Producers use this to size the next refill.
    pub fn take_underrun(&mut self) -> bool {
        std::mem::take(&mut self.underrun)
    }

    /// Mark that no more refills will arrive.
    pub fn begin_flush(&mut self) {
        if !matches!(self.state, BufferState::Empty) {
            self.state = BufferState::Flushing;
        }
    }

    /// Drop all queued frames, keeping the currently shown one.
    pub fn invalidate(&mut self) {
        self.frames.clear();
        self.cursor = 0.0;
        self.state = BufferState::Empty;
    }
}
