//! Nexus CLI - Command line client for the Nexus orchestrator.

use std::error::Error;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use nexus_client::config::DEFAULT_ORIGIN;
use nexus_client::{ClientConfig, Orchestrator, SubmitOutcome, TaskController};
use nexus_core::{segment, RunPhase, RunSession};

mod report;

use report::Format;

/// Nexus CLI - Deploy task directives to the orchestrator
#[derive(Parser)]
#[command(name = "nexus")]
#[command(about = "CLI for the Nexus orchestrator", long_about = None)]
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

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit a directive and follow it until the report arrives
    Run {
        /// Task directive
        description: String,

        /// Report output format
        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,

        /// Print links as plain text instead of terminal hyperlinks
        #[arg(long)]
        no_hyperlinks: bool,
    },

    /// Show how a text splits into literals and links
    Segment {
        /// Text to segment
        text: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("nexus=info,nexus_client=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = ClientConfig::new(cli.origin);
    config.max_consecutive_malformed = cli.max_malformed;
    if let Some(secs) = cli.submit_timeout_secs {
        config = config.with_submit_timeout(Duration::from_secs(secs));
    }

    match cli.command {
        Commands::Run {
            description,
            format,
            no_hyperlinks,
        } => {
            run(&config, &description, format, !no_hyperlinks).await?;
        }
        Commands::Segment { text } => {
            print_segments(&text);
        }
    }

    Ok(())
}

async fn run(
    config: &ClientConfig,
    description: &str,
    format: Format,
    hyperlinks: bool,
) -> Result<(), Box<dyn Error>> {
    let controller = TaskController::connect(config)?;
    info!(origin = %config.origin, "Deploying directive");
    follow(controller, description, format, hyperlinks).await
}

/// Submit, echo log lines to stderr as they arrive, then print the report.
async fn follow<O: Orchestrator>(
    mut controller: TaskController<O>,
    description: &str,
    format: Format,
    hyperlinks: bool,
) -> Result<(), Box<dyn Error>> {
    let mut printed = 0;
    if let SubmitOutcome::Rejected(e) = controller.submit(description).await {
        return Err(e.into());
    }
    print_new_lines(controller.session(), &mut printed);

    while controller.pump().await {
        print_new_lines(controller.session(), &mut printed);
    }
    print_new_lines(controller.session(), &mut printed);

    let session = controller.session();
    if let Some(out) = report::render_run(session, format, hyperlinks)? {
        println!("{}", out);
    }

    if let Some(reason) = failure(session) {
        return Err(format!("run failed: {}", reason).into());
    }

    if let Some(elapsed) = session.elapsed() {
        eprintln!(
            "Completed in {:.2}s",
            elapsed.num_milliseconds() as f64 / 1000.0
        );
    }

    Ok(())
}

/// Write log lines added since the last call to stderr.
fn print_new_lines(session: &RunSession, printed: &mut usize) {
    let lines = session.state().log_lines();
    for line in &lines[*printed..] {
        eprintln!("{}", line);
    }
    *printed = lines.len();
}

/// Last log line of a failed run, which carries the error.
fn failure(session: &RunSession) -> Option<String> {
    if session.phase() != RunPhase::Failed {
        return None;
    }
    Some(
        session
            .state()
            .log_lines()
            .last()
            .cloned()
            .unwrap_or_default(),
    )
}

fn print_segments(text: &str) {
    let segments = segment(text);
    println!("Segments ({}):", segments.len());
    println!("{:<8}  {}", "KIND", "TEXT");
    println!("{}", "-".repeat(60));

    for segment in segments {
        let kind = if segment.is_link() { "LINK" } else { "LITERAL" };
        println!("{:<8}  {:?}", kind, segment.as_str());
    }
}
