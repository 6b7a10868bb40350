//! Playback error types.

use thiserror::Error;

/// Errors surfaced by the playback director.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PlaybackError {
    /// Scheduler-level failure during a refill or registry call.
    #[error(transparent)]
    Sched(#[from] rimfax_sched::SchedError),
}

/// Result alias for playback operations.
pub type PlaybackResult<T> = Result<T, PlaybackError>;
