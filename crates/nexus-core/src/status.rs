//! Lifecycle phases of a run.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Phase of the current run in the client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunPhase {
    /// No run has been submitted yet.
    #[default]
    Idle,
    /// Submission request in flight.
    Submitting,
    /// Task queued, consuming the event stream.
    Streaming,
    /// Result received.
    Completed,
    /// Submission or stream failed.
    Failed,
}

impl RunPhase {
    /// Returns true if the run is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Returns true while a submission or stream is outstanding.
    pub fn is_processing(&self) -> bool {
        matches!(self, Self::Submitting | Self::Streaming)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "IDLE",
            Self::Submitting => "SUBMITTING",
            Self::Streaming => "STREAMING",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
        }
    }
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
