//! Error types for the orchestrator client.

use thiserror::Error;

use nexus_core::CoreError;

/// Errors that can occur when talking to the orchestrator.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Client configuration is unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Orchestrator rejected the submission or answered with an undecodable body.
    #[error("submission failed: {0}")]
    Submission(String),

    /// Event stream could not be opened, failed, or ended early.
    #[error("stream error: {0}")]
    Transport(String),

    /// A single stream frame could not be decoded.
    #[error("malformed event: {0}")]
    MalformedEvent(String),

    /// Domain error from the run state machine.
    #[error(transparent)]
    Core(#[from] CoreError),
}
