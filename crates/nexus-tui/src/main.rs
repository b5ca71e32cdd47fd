//! Nexus Terminal UI.
//!
//! Dashboard for deploying a task directive to the orchestrator and following
//! its progress until the final report arrives.

use std::error::Error;
use std::time::Duration;

use clap::Parser;
use tokio::sync::mpsc;
use tracing::{error, info};

use nexus_client::config::DEFAULT_ORIGIN;
use nexus_client::{ClientConfig, TaskController};

mod app;
mod backend;
mod event;
mod state;
mod ui;

use app::App;
use event::{BackendCommand, UiEvent};

#[derive(Parser)]
#[command(name = "nexus-tui")]
#[command(about = "Nexus Terminal UI")]
#[command(version)]
struct Cli {
    /// Orchestrator origin
    #[arg(short, long, default_value = DEFAULT_ORIGIN)]
    origin: String,

    /// Give up on the submit call after this many seconds
    #[arg(long)]
    submit_timeout_secs: Option<u64>,

    /// Consecutive malformed events before the stream is dropped (0 = never)
    #[arg(long, default_value = "3")]
    max_malformed: u32,
}

fn main() -> Result<(), Box<dyn Error>> {
    // Logs go to /tmp/nexus-tui.log to keep the terminal clean
    let log_file = std::fs::File::create("/tmp/nexus-tui.log").ok();
    if let Some(file) = log_file {
        tracing_subscriber::fmt()
            .with_writer(std::sync::Mutex::new(file))
            .with_env_filter("nexus_tui=debug,nexus_client=debug")
            .with_ansi(false)
            .init();
    }

    let cli = Cli::parse();

    let mut config = ClientConfig::new(cli.origin);
    config.max_consecutive_malformed = cli.max_malformed;
    if let Some(secs) = cli.submit_timeout_secs {
        config = config.with_submit_timeout(Duration::from_secs(secs));
    }

    // Fail on a bad origin before touching the terminal
    let controller = TaskController::connect(&config)?;
    info!(origin = %config.origin, "Starting Nexus TUI");

    // Create channels for UI <-> backend communication
    let (ui_tx, ui_rx) = mpsc::channel::<UiEvent>(100);
    let (cmd_tx, cmd_rx) = mpsc::channel::<BackendCommand>(100);

    // Spawn background thread with its own tokio runtime
    let bg_handle = std::thread::spawn(move || match tokio::runtime::Runtime::new() {
        Ok(rt) => rt.block_on(backend::run_backend(controller, ui_tx, cmd_rx)),
        Err(e) => error!(error = %e, "Failed to create tokio runtime"),
    });

    // Initialize terminal (enters alternate screen, enables raw mode)
    let terminal = ratatui::init();

    let mut app = App::new(config.origin, ui_rx, cmd_tx);
    let result = app.run(terminal);

    ratatui::restore();

    // Close the event channel so a backend blocked on a full queue sees the quit
    drop(app);
    let _ = bg_handle.join();

    info!("TUI shutdown complete");

    result.map_err(|e| e.into())
}
