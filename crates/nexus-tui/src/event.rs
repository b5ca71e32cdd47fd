//! Event types for communication between the backend and the UI.

use nexus_core::{RunPhase, RunSession, RunState, TaskId};

/// Copy of the run state taken after every change.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSnapshot {
    pub phase: RunPhase,
    pub state: RunState,
    pub task_id: Option<TaskId>,
    pub elapsed: Option<chrono::Duration>,
}

impl RunSnapshot {
    pub fn capture(session: &RunSession) -> Self {
        Self {
            phase: session.phase(),
            state: session.state().clone(),
            task_id: session.task_id().cloned(),
            elapsed: session.elapsed(),
        }
    }
}

/// Events sent from the backend to the UI thread.
#[derive(Debug)]
pub enum UiEvent {
    /// The run state changed.
    RunUpdated(RunSnapshot),

    /// A submission failed.
    Error(String),
}

/// Commands sent from the UI to the backend.
#[derive(Debug)]
pub enum BackendCommand {
    /// Deploy a directive.
    Submit(String),

    /// Quit the application.
    Quit,
}
