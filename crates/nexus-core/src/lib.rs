//! Nexus Core Domain Types
//!
//! This crate contains pure domain types with no dependencies on:
//! - Network/HTTP
//! - Terminal rendering
//! - Runtime specifics
//!
//! Everything here can be driven synchronously, which keeps the run state
//! machine testable without an orchestrator.

pub mod error;
pub mod event;
pub mod ids;
pub mod link;
pub mod session;
pub mod status;
pub mod task;

// Re-export commonly used types
pub use error::CoreError;
pub use event::StreamEvent;
pub use ids::TaskId;
pub use link::{segment, TextSegment};
pub use session::{RunSession, RunState};
pub use status::RunPhase;
pub use task::{TaskHandle, TaskSubmission};
