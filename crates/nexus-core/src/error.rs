//! Core domain errors.

use thiserror::Error;

use crate::RunPhase;

/// Core domain errors for Nexus.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Invalid input.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A run is already processing.
    #[error("A run is already in progress")]
    RunInProgress,

    /// Invalid state transition.
    #[error("Invalid state transition: {from} -> {to}")]
    InvalidTransition { from: RunPhase, to: RunPhase },

    /// Inbound event could not be decoded.
    #[error("Malformed event: {0}")]
    MalformedEvent(String),
}
