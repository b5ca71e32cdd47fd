//! Task identifiers issued by the orchestrator.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier the orchestrator hands back from `POST /submit-task`.
///
/// The reference backend issues the Unix timestamp of the submission as a
/// decimal string (`"1718000000"`), but nothing here relies on that: the id is
/// kept verbatim and only echoed back as the last path segment of
/// `/stream/{task_id}`. It serializes as a bare JSON string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id exactly as the orchestrator sent it.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for TaskId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for TaskId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}
