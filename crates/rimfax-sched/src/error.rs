//! Scheduler error types.

use thiserror::Error;

use crate::registry::SubsystemId;

/// Errors from subsystem registration and batch evolution.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SchedError {
    /// The ID does not name a live subsystem.
    #[error("unknown subsystem: {0}")]
    UnknownSubsystem(SubsystemId),

    /// A subsystem with this name is already registered.
    #[error("duplicate subsystem name: {0}")]
    DuplicateName(String),

    /// Configuration failed validation before any engine was built.
    #[error("invalid subsystem config `{name}`: {reason}")]
    InvalidConfig { name: String, reason: String },

    /// Engine-level failure.
    #[error(transparent)]
    Engine(#[from] rimfax_engine::EngineError),

    /// Matrix-level failure.
    #[error(transparent)]
    Math(#[from] rimfax_math::MathError),
}

/// Result alias for scheduler operations.
pub type SchedResult<T> = Result<T, SchedError>;
