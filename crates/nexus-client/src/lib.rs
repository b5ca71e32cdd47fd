//! Orchestrator client library for Nexus.
//!
//! Submits task directives over HTTP, consumes the per-task event stream, and
//! drives the run state machine from `nexus-core`.
//!
//! # Example
//!
//! ```rust,no_run
//! use nexus_client::{ClientConfig, TaskController};
//!
//! async fn deploy() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut controller = TaskController::connect(&ClientConfig::default())?;
//!     controller.run("Analyze AI in agriculture").await;
//!
//!     if let Some(report) = controller.state().final_result() {
//!         println!("{}", report);
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod controller;
pub mod error;
pub mod http;
pub mod orchestrator;
pub mod stream;

pub use config::ClientConfig;
pub use controller::{SubmitOutcome, TaskController};
pub use error::ClientError;
pub use http::HttpOrchestrator;
pub use orchestrator::{FrameStream, Orchestrator};
pub use stream::{StreamClient, StreamFlow, StreamHandler};
