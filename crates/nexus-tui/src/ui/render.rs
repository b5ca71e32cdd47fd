//! Main render function for the TUI.

use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, Paragraph};
use ratatui::Frame;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use nexus_core::{segment, RunPhase, TextSegment};

use super::Theme;
use crate::state::UiState;

const PLACEHOLDER: &str =
    "Enter your mission directive here... (e.g., 'Analyze the feasibility of AI in agriculture')";

/// Render the entire UI.
///
/// Returns the number of rows the final report wraps to, or 0 without one.
pub fn render(frame: &mut Frame, state: &UiState, theme: &Theme) -> usize {
    let [header_area, input_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Fill(1),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    render_header(frame, header_area, state, theme);
    render_input(frame, input_area, state, theme);
    let report_rows = render_body(frame, body_area, state, theme);
    render_footer(frame, footer_area, state, theme);
    report_rows
}

fn render_header(frame: &mut Frame, area: Rect, state: &UiState, theme: &Theme) {
    let line = Line::from(vec![
        Span::styled(" Orchestrator: ", theme.muted_style()),
        Span::raw(state.origin.as_str()),
        Span::raw("  "),
        Span::styled(state.run.phase.as_str(), theme.phase_style(state.run.phase)),
    ]);

    let header = Paragraph::new(line).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Agentic AI Nexus ")
            .title_style(theme.title_style()),
    );

    frame.render_widget(header, area);
}

fn render_input(frame: &mut Frame, area: Rect, state: &UiState, theme: &Theme) {
    let processing = state.is_processing();

    let action = if processing {
        Span::styled(" Processing... ", theme.phase_style(RunPhase::Streaming))
    } else {
        Span::styled(" [Enter] Deploy Agents ", theme.title_style())
    };
    let border = if processing {
        theme.unfocused_border()
    } else {
        theme.focused_border()
    };

    // Keep the cursor inside the box for long directives. Offsets are in cells.
    let width = area.width.saturating_sub(2) as usize;
    let cursor = state.cursor_column();
    let offset = cursor.saturating_sub(width.saturating_sub(1));

    let text = if state.input.is_empty() {
        Line::from(Span::styled(PLACEHOLDER, theme.muted_style()))
    } else {
        Line::from(state.input.as_str())
    };

    let input = Paragraph::new(text)
        .scroll((0, u16::try_from(offset).unwrap_or(u16::MAX)))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Mission Directive ")
                .title_top(Line::from(action).right_aligned())
                .border_style(border),
        );
    frame.render_widget(input, area);

    if !processing {
        let column = u16::try_from(cursor - offset).unwrap_or(0);
        frame.set_cursor_position((area.x + 1 + column, area.y + 1));
    }
}

fn render_body(frame: &mut Frame, area: Rect, state: &UiState, theme: &Theme) -> usize {
    match state.run.state.final_result() {
        Some(report) => {
            let [logs_area, report_area] =
                Layout::vertical([Constraint::Fill(1), Constraint::Fill(2)]).areas(area);
            render_logs(frame, logs_area, state, theme);
            render_report(frame, report_area, report, state.report_scroll, theme)
        }
        None => {
            render_logs(frame, area, state, theme);
            0
        }
    }
}

/// Log pane. Always shows the newest lines.
fn render_logs(frame: &mut Frame, area: Rect, state: &UiState, theme: &Theme) {
    let log_lines = state.run.state.log_lines();
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" Agent Logs ({}) ", log_lines.len()))
        .border_style(theme.unfocused_border());

    if log_lines.is_empty() {
        let empty = Paragraph::new("Awaiting directive.")
            .style(theme.muted_style())
            .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let mut lines: Vec<Line> = log_lines.iter().map(|l| log_line(l, theme)).collect();
    if state.is_processing() {
        lines.push(Line::from(Span::styled(
            "_",
            theme.title_style().add_modifier(Modifier::SLOW_BLINK),
        )));
    }

    let visible_height = area.height.saturating_sub(2) as usize;
    let skip = lines.len().saturating_sub(visible_height);
    let items: Vec<ListItem> = lines.into_iter().skip(skip).map(ListItem::new).collect();

    frame.render_widget(List::new(items).block(block), area);
}

fn log_line<'a>(line: &'a str, theme: &Theme) -> Line<'a> {
    if line.starts_with("> ❌") {
        Line::styled(line, theme.error_style())
    } else if line.starts_with("> ⚠️") {
        Line::styled(line, theme.phase_style(RunPhase::Streaming))
    } else {
        Line::raw(line)
    }
}

fn render_report(
    frame: &mut Frame,
    area: Rect,
    report: &str,
    scroll: u16,
    theme: &Theme,
) -> usize {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Final Report ")
        .title_style(theme.title_style())
        .border_style(theme.focused_border());
    let inner = block.inner(area);

    let layout = ReportLayout::build(report, inner.width as usize, theme);
    let rows = layout.lines.len();
    let scroll = scroll.min(u16::try_from(rows.saturating_sub(1)).unwrap_or(u16::MAX));

    frame.render_widget(
        Paragraph::new(layout.lines).scroll((scroll, 0)).block(block),
        area,
    );

    // Overlay OSC 8 hyperlinks on the visible link cells, two chars per cell.
    let buffer = frame.buffer_mut();
    for link in &layout.links {
        let Some(row) = link.row.checked_sub(scroll as usize) else {
            continue;
        };
        if row >= inner.height as usize {
            continue;
        }
        let y = inner.y + row as u16;
        let mut x = inner.x + link.col as u16;
        let chars: Vec<char> = link.text.chars().collect();
        for pair in chars.chunks(2) {
            if x >= inner.right() {
                break;
            }
            let text: String = pair.iter().collect();
            buffer[(x, y)].set_symbol(&hyperlink(&link.url, &text));
            x = x.saturating_add(text.width() as u16);
        }
    }

    rows
}

/// OSC 8 hyperlink around `text`. Control characters in the target are
/// dropped since ESC or BEL would end the sequence early.
fn hyperlink(url: &str, text: &str) -> String {
    let target: String = url.chars().filter(|c| !c.is_control()).collect();
    format!("\x1b]8;;{target}\x1b\\{text}\x1b]8;;\x1b\\")
}

/// Link text placed in the wrapped report, in content coordinates.
#[derive(Debug, PartialEq, Eq)]
struct PlacedLink {
    row: usize,
    col: usize,
    text: String,
    url: String,
}

/// Report text wrapped to a fixed width, with the position of every link
/// piece. Words move to the next row when they do not fit; anything wider
/// than a row, links included, is split at the row edge.
struct ReportLayout<'t> {
    width: usize,
    theme: &'t Theme,
    lines: Vec<Line<'static>>,
    current: Vec<Span<'static>>,
    col: usize,
    links: Vec<PlacedLink>,
}

impl<'t> ReportLayout<'t> {
    fn build(text: &str, width: usize, theme: &'t Theme) -> Self {
        let mut layout = Self {
            width: width.max(1),
            theme,
            lines: Vec::new(),
            current: Vec::new(),
            col: 0,
            links: Vec::new(),
        };

        for part in segment(text) {
            match part {
                TextSegment::Link(url) => layout.push_word(&url, Some(&url)),
                TextSegment::Literal(literal) => {
                    for (i, piece) in literal.split('\n').enumerate() {
                        if i > 0 {
                            layout.break_line();
                        }
                        layout.push_literal(piece.trim_end_matches('\r'));
                    }
                }
            }
        }
        layout.break_line();
        layout
    }

    fn push_literal(&mut self, text: &str) {
        let mut rest = text;
        while let Some(first) = rest.chars().next() {
            let space = first.is_whitespace();
            let end = rest
                .find(|c: char| c.is_whitespace() != space)
                .unwrap_or(rest.len());
            let (run, tail) = rest.split_at(end);
            if space {
                self.push_space(run);
            } else {
                self.push_word(run, None);
            }
            rest = tail;
        }
    }

    fn push_space(&mut self, space: &str) {
        if self.col + space.width() > self.width {
            // Whitespace at a wrap point is dropped.
            if self.col > 0 {
                self.break_line();
            }
            return;
        }
        self.place(space, None);
    }

    fn push_word(&mut self, word: &str, url: Option<&str>) {
        let width = word.width();
        if self.col > 0 && self.col + width > self.width {
            self.break_line();
        }
        if self.col + width <= self.width {
            self.place(word, url);
            return;
        }

        let mut piece = String::new();
        let mut piece_width = 0;
        for c in word.chars() {
            let char_width = c.width().unwrap_or(0);
            if self.col + piece_width > 0 && self.col + piece_width + char_width > self.width {
                self.place(&std::mem::take(&mut piece), url);
                piece_width = 0;
                self.break_line();
            }
            piece.push(c);
            piece_width += char_width;
        }
        self.place(&piece, url);
    }

    fn place(&mut self, text: &str, url: Option<&str>) {
        if text.is_empty() {
            return;
        }
        match url {
            Some(url) => {
                self.links.push(PlacedLink {
                    row: self.lines.len(),
                    col: self.col,
                    text: text.to_string(),
                    url: url.to_string(),
                });
                self.current
                    .push(Span::styled(text.to_string(), self.theme.link_style()));
            }
            None => self.current.push(Span::raw(text.to_string())),
        }
        self.col += text.width();
    }

    fn break_line(&mut self) {
        self.lines.push(Line::from(std::mem::take(&mut self.current)));
        self.col = 0;
    }
}

fn render_footer(frame: &mut Frame, area: Rect, state: &UiState, theme: &Theme) {
    let status_style = if state.last_error.is_some() {
        theme.error_style()
    } else {
        theme.phase_style(state.run.phase)
    };
    let help = " Enter: deploy | PgUp/PgDn: scroll report | Esc: quit ";

    let footer = Line::from(vec![
        Span::styled(state.status_message(), status_style),
        Span::raw(" | "),
        Span::styled(help, Style::default().fg(theme.muted)),
    ]);

    frame.render_widget(Paragraph::new(footer), area);
}
