//! Events pushed by the orchestrator on a task's stream.

use serde::{Deserialize, Serialize};

use crate::CoreError;

/// A decoded stream event.
///
/// Serializes to the orchestrator's wire shape:
/// `{"status": "log", "message": ...}` or `{"status": "result", "result": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Incremental progress line.
    Log { message: String },
    /// Final report text. Terminal: nothing follows it.
    Result { result: String },
}

/// Loose wire shape; field requirements depend on `status`.
#[derive(Debug, Deserialize)]
struct WireEvent {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    result: Option<String>,
}

impl StreamEvent {
    /// Create a log event.
    pub fn log(message: impl Into<String>) -> Self {
        Self::Log {
            message: message.into(),
        }
    }

    /// Create a result event.
    pub fn result(result: impl Into<String>) -> Self {
        Self::Result {
            result: result.into(),
        }
    }

    /// Decode one frame payload.
    ///
    /// Returns `Ok(None)` for a well-formed frame whose `status` is not one
    /// the client understands; callers skip those.
    pub fn decode(raw: &str) -> Result<Option<Self>, CoreError> {
        let wire: WireEvent =
            serde_json::from_str(raw).map_err(|e| CoreError::MalformedEvent(e.to_string()))?;

        match wire.status.as_str() {
            "log" => wire
                .message
                .map(|message| Some(Self::Log { message }))
                .ok_or_else(|| CoreError::MalformedEvent("log event without message".to_string())),
            "result" => wire
                .result
                .map(|result| Some(Self::Result { result }))
                .ok_or_else(|| {
                    CoreError::MalformedEvent("result event without result".to_string())
                }),
            _ => Ok(None),
        }
    }

    /// Returns true if no further events follow this one.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Result { .. })
    }

    /// Encode to the wire payload.
    pub fn to_json(&self) -> String {
        // A two-variant enum of strings cannot fail to serialize.
        serde_json::to_string(self).unwrap_or_default()
    }
}
