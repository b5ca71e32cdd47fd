//! Task lifecycle controller.
//!
//! Couples the [`RunSession`] state machine with an [`Orchestrator`] and the
//! [`StreamClient`] of the current run. The controller is the only owner of
//! the stream: it opens it after a successful submission and closes it on the
//! terminal event or on failure.

use tracing::{debug, error, info, warn};

use nexus_core::{
    CoreError, RunPhase, RunSession, RunState, StreamEvent, TaskHandle, TaskSubmission,
};

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::http::HttpOrchestrator;
use crate::orchestrator::Orchestrator;
use crate::stream::{StreamClient, StreamFlow, StreamHandler};

/// What a call to [`TaskController::submit`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Task queued; its stream is open.
    Streaming(TaskHandle),
    /// Submitting or opening the stream failed; the run ended in
    /// [`RunPhase::Failed`].
    Failed(String),
    /// Nothing happened: empty directive or a run already in progress.
    Rejected(CoreError),
}

/// Drives one run at a time against an orchestrator.
pub struct TaskController<O> {
    orchestrator: O,
    session: RunSession,
    stream: Option<StreamClient>,
    max_consecutive_malformed: u32,
}

impl TaskController<HttpOrchestrator> {
    /// Controller talking to the orchestrator named in `config`.
    pub fn connect(config: &ClientConfig) -> Result<Self, ClientError> {
        Ok(Self::new(HttpOrchestrator::new(config)?, config))
    }
}

impl<O: Orchestrator> TaskController<O> {
    pub fn new(orchestrator: O, config: &ClientConfig) -> Self {
        Self {
            orchestrator,
            session: RunSession::new(),
            stream: None,
            max_consecutive_malformed: config.max_consecutive_malformed,
        }
    }

    pub fn orchestrator(&self) -> &O {
        &self.orchestrator
    }

    pub fn session(&self) -> &RunSession {
        &self.session
    }

    pub fn state(&self) -> &RunState {
        self.session.state()
    }

    pub fn phase(&self) -> RunPhase {
        self.session.phase()
    }

    /// Returns true while a stream is open.
    pub fn is_streaming(&self) -> bool {
        self.stream.is_some()
    }

    /// Submit a directive and, on success, open its event stream.
    ///
    /// Empty directives and calls made while a run is processing are
    /// rejected with no state change.
    pub async fn submit(&mut self, description: &str) -> SubmitOutcome {
        if let Err(e) = self.begin(description) {
            return SubmitOutcome::Rejected(e);
        }
        self.send().await
    }

    /// First half of [`submit`](Self::submit): validate the directive and
    /// reset the run state, without any network traffic.
    pub fn begin(&mut self, description: &str) -> Result<(), CoreError> {
        let submission = TaskSubmission::new(description).map_err(|e| {
            debug!("Ignoring empty task description");
            e
        })?;

        let phase = self.session.phase();
        self.session.begin(&submission).map_err(|e| {
            warn!(phase = %phase, "Submission rejected: run in progress");
            e
        })
    }

    /// Second half of [`submit`](Self::submit): send the directive of a run
    /// started with [`begin`](Self::begin) and open its stream.
    pub async fn send(&mut self) -> SubmitOutcome {
        let submission = match (self.session.phase(), self.session.submission()) {
            (RunPhase::Submitting, Some(submission)) => submission.clone(),
            (phase, _) => {
                return SubmitOutcome::Rejected(CoreError::InvalidTransition {
                    from: phase,
                    to: RunPhase::Streaming,
                });
            }
        };

        info!(
            description_len = submission.description().len(),
            "Submitting task"
        );

        match self.orchestrator.submit_task(&submission).await {
            Ok(handle) => {
                info!(task_id = %handle.task_id, "Task queued");
                check(self.session.submitted(handle.clone()));
                match self.open_stream(&handle).await {
                    Ok(()) => SubmitOutcome::Streaming(handle),
                    Err(message) => SubmitOutcome::Failed(message),
                }
            }
            Err(e) => {
                error!(error = %e, "Task submission failed");
                let message = e.to_string();
                check(self.session.submission_failed(&message));
                SubmitOutcome::Failed(message)
            }
        }
    }

    /// Process the next stream frame.
    ///
    /// Returns true while the stream stays open; false once the run reached a
    /// terminal state or no stream is open.
    pub async fn pump(&mut self) -> bool {
        let Some(stream) = self.stream.as_mut() else {
            return false;
        };

        let mut sink = SessionSink {
            session: &mut self.session,
        };
        let flow = stream.pump(&mut sink).await;

        if flow == StreamFlow::Closed {
            self.close_stream();
            if let Some(elapsed) = self.session.elapsed() {
                info!(
                    phase = %self.session.phase(),
                    elapsed_ms = elapsed.num_milliseconds(),
                    "Run finished"
                );
            }
            return false;
        }
        true
    }

    /// Submit a directive and consume its stream until the run ends.
    pub async fn run(&mut self, description: &str) -> SubmitOutcome {
        let outcome = self.submit(description).await;
        if matches!(outcome, SubmitOutcome::Streaming(_)) {
            while self.pump().await {}
        }
        outcome
    }

    async fn open_stream(&mut self, handle: &TaskHandle) -> Result<(), String> {
        match self.orchestrator.open_stream(&handle.task_id).await {
            Ok(frames) => {
                self.stream = Some(StreamClient::open(
                    handle.task_id.clone(),
                    frames,
                    self.max_consecutive_malformed,
                ));
                Ok(())
            }
            Err(e) => {
                error!(task_id = %handle.task_id, error = %e, "Failed to open event stream");
                let message = e.to_string();
                check(self.session.stream_failed(&message));
                Err(message)
            }
        }
    }

    fn close_stream(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.close();
        }
    }
}

/// Feeds stream callbacks into the session.
struct SessionSink<'a> {
    session: &'a mut RunSession,
}

impl StreamHandler for SessionSink<'_> {
    fn on_log(&mut self, message: String) {
        check(self.session.apply(StreamEvent::Log { message }));
    }

    fn on_result(&mut self, result: String) {
        check(self.session.apply(StreamEvent::Result { result }));
    }

    fn on_error(&mut self, error: ClientError) {
        match error {
            ClientError::MalformedEvent(detail) => {
                check(self.session.skipped_malformed(&detail));
            }
            other => check(self.session.stream_failed(&other.to_string())),
        }
    }
}

/// Transitions rejected by the state machine leave the state unchanged.
fn check(result: Result<(), CoreError>) {
    if let Err(e) = result {
        warn!(error = %e, "Ignoring event");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use futures_util::stream;

    use nexus_core::session::{LINE_COMPLETE, LINE_ESTABLISHING, LINE_INITIALIZED, LINE_WAITING};
    use nexus_core::TaskId;

    use crate::orchestrator::FrameStream;

    /// In-memory orchestrator. `frames: None` keeps the stream open forever.
    struct MockOrchestrator {
        submit_result: Result<&'static str, &'static str>,
        frames: Mutex<Option<Vec<Result<String, ClientError>>>>,
        open_error: Option<&'static str>,
        submits: AtomicUsize,
        opened: Mutex<Vec<TaskId>>,
    }

    impl MockOrchestrator {
        fn queued(task_id: &'static str, frames: Vec<Result<String, ClientError>>) -> Self {
            Self {
                submit_result: Ok(task_id),
                frames: Mutex::new(Some(frames)),
                open_error: None,
                submits: AtomicUsize::new(0),
                opened: Mutex::new(Vec::new()),
            }
        }

        fn hanging(task_id: &'static str) -> Self {
            Self {
                frames: Mutex::new(None),
                ..Self::queued(task_id, Vec::new())
            }
        }

        fn failing(message: &'static str) -> Self {
            Self {
                submit_result: Err(message),
                ..Self::queued("unused", Vec::new())
            }
        }

        fn submits(&self) -> usize {
            self.submits.load(Ordering::SeqCst)
        }

        fn opened(&self) -> Vec<TaskId> {
            self.opened.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Orchestrator for MockOrchestrator {
        async fn submit_task(
            &self,
            _submission: &TaskSubmission,
        ) -> Result<TaskHandle, ClientError> {
            self.submits.fetch_add(1, Ordering::SeqCst);
            self.submit_result
                .map(TaskHandle::new)
                .map_err(|msg| ClientError::Submission(msg.to_string()))
        }

        async fn open_stream(&self, task_id: &TaskId) -> Result<FrameStream, ClientError> {
            self.opened.lock().unwrap().push(task_id.clone());
            if let Some(msg) = self.open_error {
                return Err(ClientError::Transport(msg.to_string()));
            }
            match self.frames.lock().unwrap().take() {
                Some(frames) => Ok(Box::pin(stream::iter(frames))),
                None => Ok(Box::pin(stream::pending::<Result<String, ClientError>>())),
            }
        }
    }

    fn frame(event: StreamEvent) -> Result<String, ClientError> {
        Ok(event.to_json())
    }

    fn controller(orchestrator: MockOrchestrator) -> TaskController<MockOrchestrator> {
        TaskController::new(orchestrator, &ClientConfig::default())
    }

    #[tokio::test]
    async fn test_full_run_scenario() {
        let mut controller = controller(MockOrchestrator::queued(
            "T1",
            vec![
                frame(StreamEvent::log("step 1")),
                frame(StreamEvent::log("step 2")),
                frame(StreamEvent::result("Done. See https://x.test/r")),
            ],
        ));

        let outcome = controller.run("Analyze AI in agriculture").await;

        assert_eq!(outcome, SubmitOutcome::Streaming(TaskHandle::new("T1")));
        assert_eq!(controller.phase(), RunPhase::Completed);
        assert!(!controller.state().is_processing());
        assert!(!controller.is_streaming());
        assert_eq!(
            controller.state().final_result(),
            Some("Done. See https://x.test/r")
        );
        assert_eq!(
            controller.state().log_lines(),
            &[
                LINE_INITIALIZED.to_string(),
                LINE_ESTABLISHING.to_string(),
                "> ✅ Task Queued! ID: T1".to_string(),
                LINE_WAITING.to_string(),
                "> step 1".to_string(),
                "> step 2".to_string(),
                LINE_COMPLETE.to_string(),
            ]
        );
        assert_eq!(controller.orchestrator().opened(), vec![TaskId::new("T1")]);
    }

    #[tokio::test]
    async fn test_submission_network_error() {
        let mut controller = controller(MockOrchestrator::failing("connection refused"));

        let outcome = controller.run("Analyze AI in agriculture").await;

        assert!(matches!(outcome, SubmitOutcome::Failed(_)));
        assert_eq!(controller.phase(), RunPhase::Failed);
        assert!(!controller.state().is_processing());
        assert!(!controller.is_streaming());
        assert!(controller.orchestrator().opened().is_empty());
        assert_eq!(
            controller.state().log_lines().last().map(String::as_str),
            Some("> ❌ Error: submission failed: connection refused")
        );
    }

    #[tokio::test]
    async fn test_second_submit_while_processing_is_noop() {
        let mut controller = controller(MockOrchestrator::hanging("T1"));

        let first = controller.submit("Analyze AI in agriculture").await;
        assert!(matches!(first, SubmitOutcome::Streaming(_)));
        assert!(controller.state().is_processing());
        let before = controller.state().clone();

        let second = controller.submit("Another directive").await;

        assert_eq!(second, SubmitOutcome::Rejected(CoreError::RunInProgress));
        assert_eq!(controller.state(), &before);
        assert_eq!(controller.phase(), RunPhase::Streaming);
        assert!(controller.is_streaming());
        assert_eq!(controller.orchestrator().submits(), 1);
    }

    #[tokio::test]
    async fn test_empty_description_is_noop() {
        let mut controller = controller(MockOrchestrator::hanging("T1"));

        let outcome = controller.submit("   ").await;

        assert!(matches!(
            outcome,
            SubmitOutcome::Rejected(CoreError::InvalidInput(_))
        ));
        assert_eq!(controller.phase(), RunPhase::Idle);
        assert_eq!(controller.state(), &RunState::default());
        assert_eq!(controller.orchestrator().submits(), 0);
    }

    #[tokio::test]
    async fn test_begin_then_send() {
        let mut controller = controller(MockOrchestrator::hanging("T1"));

        assert_eq!(
            controller.send().await,
            SubmitOutcome::Rejected(CoreError::InvalidTransition {
                from: RunPhase::Idle,
                to: RunPhase::Streaming,
            })
        );

        controller.begin("Analyze AI in agriculture").unwrap();
        assert_eq!(controller.phase(), RunPhase::Submitting);
        assert_eq!(
            controller.state().log_lines(),
            &[LINE_INITIALIZED.to_string(), LINE_ESTABLISHING.to_string()]
        );
        assert_eq!(controller.orchestrator().submits(), 0);

        assert!(matches!(controller.send().await, SubmitOutcome::Streaming(_)));
        assert_eq!(controller.phase(), RunPhase::Streaming);
        assert_eq!(controller.orchestrator().submits(), 1);
    }

    #[tokio::test]
    async fn test_stream_drop_fails_run() {
        let mut controller = controller(MockOrchestrator::queued(
            "T1",
            vec![
                frame(StreamEvent::log("step 1")),
                Err(ClientError::Transport("connection reset".to_string())),
            ],
        ));

        controller.run("Analyze AI in agriculture").await;

        assert_eq!(controller.phase(), RunPhase::Failed);
        assert!(!controller.state().is_processing());
        assert!(!controller.is_streaming());
        assert_eq!(controller.state().final_result(), None);
        assert_eq!(
            controller.state().log_lines().last().map(String::as_str),
            Some("> ❌ Error: stream error: connection reset")
        );
    }

    #[tokio::test]
    async fn test_stream_open_failure_fails_run() {
        let mut controller = controller(MockOrchestrator {
            open_error: Some("HTTP 404 Not Found opening stream"),
            ..MockOrchestrator::queued("T1", Vec::new())
        });

        let outcome = controller.submit("Analyze AI in agriculture").await;

        assert_eq!(
            outcome,
            SubmitOutcome::Failed("stream error: HTTP 404 Not Found opening stream".to_string())
        );
        assert_eq!(controller.phase(), RunPhase::Failed);
        assert!(!controller.state().is_processing());
        assert!(!controller.is_streaming());
        assert!(!controller.pump().await);
    }

    #[tokio::test]
    async fn test_malformed_frame_does_not_end_run() {
        let mut controller = controller(MockOrchestrator::queued(
            "T1",
            vec![
                Ok("{broken".to_string()),
                frame(StreamEvent::log("step 1")),
                frame(StreamEvent::result("report")),
            ],
        ));

        controller.run("Analyze AI in agriculture").await;

        let lines = controller.state().log_lines();
        assert_eq!(controller.phase(), RunPhase::Completed);
        assert!(lines[4].starts_with("> ⚠️ Skipped malformed event:"));
        assert_eq!(lines[5], "> step 1");
        assert_eq!(controller.state().final_result(), Some("report"));
    }

    #[tokio::test]
    async fn test_events_after_result_are_not_read() {
        let mut controller = controller(MockOrchestrator::queued(
            "T1",
            vec![
                frame(StreamEvent::result("final")),
                frame(StreamEvent::result("second")),
                frame(StreamEvent::log("late")),
            ],
        ));

        controller.submit("Analyze AI in agriculture").await;
        assert!(!controller.pump().await);
        assert!(!controller.pump().await);

        assert_eq!(controller.state().final_result(), Some("final"));
        assert_eq!(
            controller.state().log_lines().last().map(String::as_str),
            Some(LINE_COMPLETE)
        );
    }

    #[tokio::test]
    async fn test_resubmit_after_completion_resets_state() {
        let mut controller = controller(MockOrchestrator::queued(
            "T1",
            vec![frame(StreamEvent::result("first report"))],
        ));
        controller.run("first").await;
        assert_eq!(controller.state().final_result(), Some("first report"));

        // The mock's frames are used up, so the second stream never ends.
        let outcome = controller.submit("second").await;

        assert!(matches!(outcome, SubmitOutcome::Streaming(_)));
        assert_eq!(controller.state().final_result(), None);
        assert!(controller.state().is_processing());
        assert_eq!(controller.state().log_lines().len(), 4);
        assert_eq!(controller.orchestrator().submits(), 2);
    }
}
