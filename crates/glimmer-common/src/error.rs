//! Error types for Glimmer.

use crate::ids::EffectId;
use thiserror::Error;

/// Top-level error type for Glimmer operations.
#[derive(Debug, Error)]
pub enum GlimmerError {
    /// Particle pool errors
    #[error("Pool error: {0}")]
    Pool(#[from] PoolError),

    /// Effect registry errors
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Particle pool errors.
///
/// Rejection is backpressure, not a failure: callers stop emitting for the
/// current frame and try again on the next one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PoolError {
    /// The pool already holds as many particles as it may.
    #[error("particle pool is at capacity ({capacity})")]
    AtCapacity {
        /// Configured capacity
        capacity: usize,
    },
}

/// Effect registry errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EngineError {
    /// No live effect with this ID
    #[error("unknown effect: {0}")]
    UnknownEffect(EffectId),
}

/// Result type alias for Glimmer operations.
pub type GlimmerResult<T> = Result<T, GlimmerError>;
