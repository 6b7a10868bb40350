//! Wall-clock playback of lookahead simulation batches.
//!
//! The simulation side produces snapshots in bursts; the render side
//! consumes them at wall-clock speed. [`SnapshotBuffer`] is the ring between
//! the two, [`EscalationLadder`] sizes refills on a Fibonacci ladder when
//! playback outruns production, and [`Director`] is the single facade a
//! host embeds: register subsystems, call [`Director::tick_physics`] on the
//! simulation cadence and [`Director::tick_render`] on the frame cadence,
//! and read snapshots without ever blocking on the integrator.

pub mod buffer;
pub mod director;
pub mod error;
pub mod escalation;

pub use buffer::{BufferState, SnapshotBuffer};
pub use director::{Director, DirectorConfig};
pub use error::{PlaybackError, PlaybackResult};
pub use escalation::EscalationLadder;
