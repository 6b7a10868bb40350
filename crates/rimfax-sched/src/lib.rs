//! Subsystem registry and lookahead batch scheduling.
//!
//! A [`SubsystemRegistry`] owns many independent open quantum systems, each
//! built from a declarative [`SubsystemConfig`] and addressed by an opaque
//! [`SubsystemId`]. One [`SubsystemRegistry::evolve_all_lookahead`] call
//! advances every active subsystem several steps into the future and returns
//! a [`LookaheadBatch`] of snapshots, which is what the playback layer
//! buffers against wall-clock time.

pub mod config;
pub mod error;
pub mod registry;

pub use config::SubsystemConfig;
pub use error::{SchedError, SchedResult};
pub use registry::{LookaheadBatch, SubsystemId, SubsystemRegistry, SubsystemTrack};
