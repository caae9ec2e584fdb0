use std::borrow::Cow;
use std::time::Duration;

use console::{Term, measure_text_width};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::warn;

use super::presenter::{ChatMessageType, style_chat_text};

const ELLIPSIS: &str = "...";
const SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Destination for everything shown to the user during a session.
///
/// The live region is a block of text that can be redrawn in place until it
/// is frozen with [`OutputSink::finish_live`].
pub trait OutputSink {
    /// Shows a permanent block of text.
    fn print(&mut self, text: &str);
    /// Replaces the live region with `text`.
    fn update_live(&mut self, text: &str);
    /// Leaves the full live text on screen; the next update starts a new one.
    fn finish_live(&mut self);
    /// Shows a transient progress indicator.
    fn start_progress(&mut self, message: &str);
    /// Removes the progress indicator, if any.
    fn stop_progress(&mut self);
    fn error(&mut self, message: &str);
    fn warning(&mut self, message: &str);
    fn info(&mut self, message: &str);
    /// Reports a problem on the diagnostic stream, apart from the display.
    fn diagnostic(&mut self, message: &str);
}

/// Terminal rows `line` wraps to at `width` columns.
fn line_rows(line: &str, width: usize) -> usize {
    measure_text_width(line).max(1).div_ceil(width.max(1))
}

/// Rows `text` occupies once written, accounting for soft wraps.
fn text_rows(text: &str, width: usize) -> usize {
    text.split('\n').map(|line| line_rows(line, width)).sum()
}

/// Keeps the tail of `line` that fits in `max_cols` display columns.
fn line_tail(line: &str, max_cols: usize) -> &str {
    let mut cols = 0;
    let mut start = line.len();
    for (idx, ch) in line.char_indices().rev() {
        let mut buf = [0u8; 4];
        cols += measure_text_width(ch.encode_utf8(&mut buf));
        if cols > max_cols {
            break;
        }
        start = idx;
    }
    &line[start..]
}

/// Crops `text` to its last rows so that it fits in `max_rows` terminal rows.
///
/// A cropped result starts with an ellipsis line. Returns the text to draw
/// and the rows it occupies.
fn crop_to_rows(text: &str, width: usize, max_rows: usize) -> (Cow<'_, str>, usize) {
    let max_rows = max_rows.max(2);
    let rows = text_rows(text, width);
    if rows <= max_rows {
        return (Cow::Borrowed(text), rows);
    }

    // One row goes to the ellipsis
    let budget = max_rows - 1;
    let mut used = 0;
    let mut kept: Vec<&str> = Vec::new();
    for line in text.rsplit('\n') {
        let rows = line_rows(line, width);
        if used + rows <= budget {
            used += rows;
            kept.push(line);
            continue;
        }
        let remaining = budget - used;
        if remaining > 0 {
            let tail = line_tail(line, remaining * width.max(1));
            used += line_rows(tail, width);
            kept.push(tail);
        }
        break;
    }
    kept.push(ELLIPSIS);
    kept.reverse();
    (Cow::Owned(kept.join("\n")), used + 1)
}

/// `OutputSink` writing to the terminal.
///
/// The live region never grows past the terminal height: while it is live
/// only its last rows are drawn, and the full text is written once when it
/// is finished.
pub struct TerminalSink {
    term: Term,
    diagnostics: Term,
    spinner: Option<ProgressBar>,
    live_text: String,
    // Terminal rows covered by the current live region
    live_rows: usize,
    live_cropped: bool,
}

impl TerminalSink {
    pub fn new(term: Term, diagnostics: Term) -> Self {
        Self {
            term,
            diagnostics,
            spinner: None,
            live_text: String::new(),
            live_rows: 0,
            live_cropped: false,
        }
    }

    pub fn stdout() -> Self {
        Self::new(Term::stdout(), Term::stderr())
    }

    fn write_line(&self, text: &str) {
        if let Err(e) = self.term.write_line(text) {
            warn!("Failed to write to terminal: {e}");
        }
    }

    fn clear_live(&mut self) {
        if self.live_rows > 0
            && let Err(e) = self.term.clear_last_lines(self.live_rows)
        {
            warn!("Failed to clear live region: {e}");
        }
        self.live_rows = 0;
    }
}

impl OutputSink for TerminalSink {
    fn print(&mut self, text: &str) {
        self.write_line(text);
    }

    fn update_live(&mut self, text: &str) {
        let (height, width) = self.term.size();
        // Leave a row for the cursor so nothing scrolls out of reach
        let max_rows = (height as usize).saturating_sub(1);
        let (visible, rows) = crop_to_rows(text, width as usize, max_rows);

        self.clear_live();
        self.write_line(&visible);
        self.live_rows = rows;
        self.live_cropped = matches!(visible, Cow::Owned(_));
        self.live_text.clear();
        self.live_text.push_str(text);
    }

    fn finish_live(&mut self) {
        if self.live_cropped {
            self.clear_live();
            let text = std::mem::take(&mut self.live_text);
            self.write_line(&text);
        }
        self.live_text.clear();
        self.live_rows = 0;
        self.live_cropped = false;
    }

    fn start_progress(&mut self, message: &str) {
        self.stop_progress();
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.blue} {msg}") {
            spinner.set_style(style.tick_strings(SPINNER_FRAMES));
        }
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(Duration::from_millis(100));
        self.spinner = Some(spinner);
    }

    fn stop_progress(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }

    fn error(&mut self, message: &str) {
        let label = style_chat_text("Error:", ChatMessageType::Error);
        self.write_line(&format!("{label} {message}"));
    }

    fn warning(&mut self, message: &str) {
        self.write_line(&style_chat_text(message, ChatMessageType::Warning).to_string());
    }

    fn info(&mut self, message: &str) {
        self.write_line(&style_chat_text(message, ChatMessageType::Info).to_string());
    }

    fn diagnostic(&mut self, message: &str) {
        if let Err(e) = self.diagnostics.write_line(message) {
            warn!("Failed to write diagnostic: {e}");
        }
    }
}
