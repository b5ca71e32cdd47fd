//! Task submission types.

use serde::{Deserialize, Serialize};

use crate::{CoreError, TaskId};

/// A validated task directive, ready to be sent to the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskSubmission {
    /// Free-text directive, sent verbatim.
    #[serde(rename = "task_description")]
    description: String,
}

impl TaskSubmission {
    /// Validate a directive.
    ///
    /// Descriptions that are empty or consist only of whitespace are rejected.
    pub fn new(description: impl Into<String>) -> Result<Self, CoreError> {
        let description = description.into();
        if description.trim().is_empty() {
            return Err(CoreError::InvalidInput(
                "task description must not be empty".to_string(),
            ));
        }
        Ok(Self { description })
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

/// Handle returned by the orchestrator for a queued task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskHandle {
    /// Identifier used to open the task's event stream.
    pub task_id: TaskId,

    /// Queue status reported at submission time (e.g. "queued").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl TaskHandle {
    pub fn new(task_id: impl Into<TaskId>) -> Self {
        Self {
            task_id: task_id.into(),
            status: None,
        }
    }
}
