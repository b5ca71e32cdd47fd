//! Seam between the run controller and the orchestrator service.

use std::pin::Pin;

use async_trait::async_trait;
use futures_util::Stream;

use nexus_core::{TaskHandle, TaskId, TaskSubmission};

use crate::error::ClientError;

/// Raw frame payloads of one task's event stream, in transport order.
pub type FrameStream = Pin<Box<dyn Stream<Item = Result<String, ClientError>> + Send>>;

/// Orchestrator operations the controller depends on.
///
/// [`crate::HttpOrchestrator`] talks to the real service; tests supply
/// in-memory implementations.
#[async_trait]
pub trait Orchestrator: Send + Sync {
    /// Queue a task and return its handle.
    async fn submit_task(&self, submission: &TaskSubmission) -> Result<TaskHandle, ClientError>;

    /// Open the event stream for a queued task.
    async fn open_stream(&self, task_id: &TaskId) -> Result<FrameStream, ClientError>;
}
