//! Run state machine.
//!
//! `RunSession` is the single mutation boundary for a run's observable state.
//! Every transition goes through one of its methods, which check the current
//! [`RunPhase`] first, so invariants such as "a final result implies the run
//! is no longer processing" hold by construction.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{CoreError, RunPhase, StreamEvent, TaskHandle, TaskId, TaskSubmission};

/// First status line of every run.
pub const LINE_INITIALIZED: &str = "> 🚀 System Initialized...";
/// Second status line of every run.
pub const LINE_ESTABLISHING: &str = "> 📡 Establishing link to Orchestrator...";
/// Logged once the orchestrator accepted the task.
pub const LINE_WAITING: &str = "> ⏳ Waiting for Batch Processing...";
/// Logged when the result arrives.
pub const LINE_COMPLETE: &str = "> 🏁 Process Complete.";

/// Observable state of the current run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunState {
    log_lines: Vec<String>,
    is_processing: bool,
    final_result: Option<String>,
}

impl RunState {
    /// Log lines in arrival order.
    pub fn log_lines(&self) -> &[String] {
        &self.log_lines
    }

    pub fn is_processing(&self) -> bool {
        self.is_processing
    }

    /// Report text, once the result event has arrived.
    pub fn final_result(&self) -> Option<&str> {
        self.final_result.as_deref()
    }
}

/// State machine for one client session, reused across runs.
#[derive(Debug, Clone, Default)]
pub struct RunSession {
    phase: RunPhase,
    state: RunState,
    submission: Option<TaskSubmission>,
    handle: Option<TaskHandle>,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
}

impl RunSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    /// Directive of the current (or last) run.
    pub fn submission(&self) -> Option<&TaskSubmission> {
        self.submission.as_ref()
    }

    /// Handle of the task being streamed, once submission succeeded.
    pub fn handle(&self) -> Option<&TaskHandle> {
        self.handle.as_ref()
    }

    pub fn task_id(&self) -> Option<&TaskId> {
        self.handle.as_ref().map(|h| &h.task_id)
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// Wall time from submission to the terminal transition.
    pub fn elapsed(&self) -> Option<chrono::Duration> {
        Some(self.finished_at? - self.started_at?)
    }

    /// Start a new run: reset state and seed the status lines.
    ///
    /// Rejected without any state change while a run is processing.
    pub fn begin(&mut self, submission: &TaskSubmission) -> Result<(), CoreError> {
        if self.phase.is_processing() {
            return Err(CoreError::RunInProgress);
        }

        self.state = RunState {
            log_lines: vec![LINE_INITIALIZED.to_string(), LINE_ESTABLISHING.to_string()],
            is_processing: true,
            final_result: None,
        };
        self.submission = Some(submission.clone());
        self.handle = None;
        self.phase = RunPhase::Submitting;
        self.started_at = Some(Utc::now());
        self.finished_at = None;
        Ok(())
    }

    /// The orchestrator queued the task.
    pub fn submitted(&mut self, handle: TaskHandle) -> Result<(), CoreError> {
        self.expect(RunPhase::Submitting, RunPhase::Streaming)?;

        self.push(format!("> ✅ Task Queued! ID: {}", handle.task_id));
        self.push(LINE_WAITING.to_string());
        self.handle = Some(handle);
        self.phase = RunPhase::Streaming;
        Ok(())
    }

    /// The submission call failed; the run ends without a stream.
    pub fn submission_failed(&mut self, message: &str) -> Result<(), CoreError> {
        self.expect(RunPhase::Submitting, RunPhase::Failed)?;
        self.fail(message);
        Ok(())
    }

    /// Fold one stream event into the state.
    ///
    /// Only accepted while streaming; after the result event every further
    /// event is rejected and leaves the state untouched.
    pub fn apply(&mut self, event: StreamEvent) -> Result<(), CoreError> {
        match event {
            StreamEvent::Log { message } => {
                self.expect(RunPhase::Streaming, RunPhase::Streaming)?;
                self.push(format!("> {}", message));
            }
            StreamEvent::Result { result } => {
                self.expect(RunPhase::Streaming, RunPhase::Completed)?;
                self.state.final_result = Some(result);
                self.push(LINE_COMPLETE.to_string());
                self.finish(RunPhase::Completed);
            }
        }
        Ok(())
    }

    /// Record a frame that could not be decoded. The run keeps streaming.
    pub fn skipped_malformed(&mut self, detail: &str) -> Result<(), CoreError> {
        self.expect(RunPhase::Streaming, RunPhase::Streaming)?;
        self.push(format!("> ⚠️ Skipped malformed event: {}", detail));
        Ok(())
    }

    /// The stream failed or ended before delivering a result.
    pub fn stream_failed(&mut self, message: &str) -> Result<(), CoreError> {
        self.expect(RunPhase::Streaming, RunPhase::Failed)?;
        self.fail(message);
        Ok(())
    }

    fn expect(&self, from: RunPhase, to: RunPhase) -> Result<(), CoreError> {
        if self.phase != from {
            return Err(CoreError::InvalidTransition {
                from: self.phase,
                to,
            });
        }
        Ok(())
    }

    fn push(&mut self, line: String) {
        self.state.log_lines.push(line);
    }

    fn fail(&mut self, message: &str) {
        self.push(format!("> ❌ Error: {}", message));
        self.finish(RunPhase::Failed);
    }

    fn finish(&mut self, phase: RunPhase) {
        self.state.is_processing = false;
        self.phase = phase;
        self.finished_at = Some(Utc::now());
    }
}
