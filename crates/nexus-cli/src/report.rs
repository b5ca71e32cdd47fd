//! Report rendering for the terminal, for HTML and as JSON.

use clap::ValueEnum;
use serde::Serialize;

use nexus_core::{segment, RunPhase, RunSession, RunState, TaskId, TextSegment};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Text,
    Html,
    Json,
}

/// JSON form of a finished run.
#[derive(Serialize)]
struct RunReport<'a> {
    task_id: Option<&'a TaskId>,
    phase: RunPhase,
    elapsed_ms: Option<i64>,
    #[serde(flatten)]
    state: &'a RunState,
    segments: Vec<TextSegment>,
}

/// What to print on stdout once a run is over.
///
/// Text and HTML print the report only when one arrived; JSON always
/// describes the run, failed runs included.
pub fn render_run(
    session: &RunSession,
    format: Format,
    hyperlinks: bool,
) -> Result<Option<String>, serde_json::Error> {
    let state = session.state();
    let segments = segment(state.final_result().unwrap_or_default());

    let out = match format {
        Format::Text => state
            .final_result()
            .map(|_| render_terminal(&segments, hyperlinks)),
        Format::Html => state.final_result().map(|_| render_html(&segments)),
        Format::Json => Some(serde_json::to_string_pretty(&RunReport {
            task_id: session.task_id(),
            phase: session.phase(),
            elapsed_ms: session.elapsed().map(|d| d.num_milliseconds()),
            state,
            segments,
        })?),
    };
    Ok(out)
}

/// Render segments for a terminal.
///
/// With `hyperlinks` on, links become OSC 8 hyperlinks; terminals that do not
/// understand the sequence show the plain URL. Literal text is written as-is.
pub fn render_terminal(segments: &[TextSegment], hyperlinks: bool) -> String {
    let mut out = String::new();
    for segment in segments {
        match segment {
            TextSegment::Link(url) if hyperlinks => {
                out.push_str("\x1b]8;;");
                out.push_str(&strip_controls(url));
                out.push_str("\x1b\\");
                out.push_str(url);
                out.push_str("\x1b]8;;\x1b\\");
            }
            other => out.push_str(other.as_str()),
        }
    }
    out
}

/// Render segments as an HTML fragment.
///
/// Whitespace and line breaks survive through `white-space: pre-wrap`. Links
/// open in a new tab with no opener and no referrer.
pub fn render_html(segments: &[TextSegment]) -> String {
    let mut out = String::from(r#"<div class="report" style="white-space: pre-wrap">"#);
    for segment in segments {
        match segment {
            TextSegment::Literal(text) => out.push_str(&escape_html(text)),
            TextSegment::Link(url) => {
                let url = escape_html(url);
                out.push_str(&format!(
                    r#"<a href="{url}" target="_blank" rel="noopener noreferrer">{url}</a>"#
                ));
            }
        }
    }
    out.push_str("</div>");
    out
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

// A URL containing ESC or BEL would terminate the OSC sequence early.
fn strip_controls(url: &str) -> String {
    url.chars().filter(|c| !c.is_control()).collect()
}
