//! Append-only persistence of conversation turns.
//!
//! Two independent destinations are supported: a JSON-lines log with one
//! serialized [`Turn`] per line, and a Markdown transcript for humans.
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::conversation::Turn;
use crate::error::TranscriptError;

/// Formats a turn as a labeled Markdown block, e.g. `**User**: Hello\n\n`.
pub fn format_turn_markdown(turn: &Turn) -> String {
    format!("**{}**: {}\n\n", turn.role.label(), turn.content)
}

fn append_to(kind: &'static str, path: &Path, text: &str) -> Result<(), TranscriptError> {
    let to_err = |source| TranscriptError::Write {
        kind,
        path: path.to_path_buf(),
        source,
    };
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(to_err)?;
    file.write_all(text.as_bytes()).map_err(to_err)?;
    file.flush().map_err(to_err)
}

/// Appends `turns` to a JSON-lines log.
pub fn log_conversation(path: &Path, turns: &[Turn]) -> Result<(), TranscriptError> {
    let mut lines = String::new();
    for turn in turns {
        lines.push_str(&serde_json::to_string(turn)?);
        lines.push('\n');
    }
    append_to("log", path, &lines)
}

/// Appends `turns` to a Markdown transcript.
pub fn write_markdown(path: &Path, turns: &[Turn]) -> Result<(), TranscriptError> {
    let text: String = turns.iter().map(format_turn_markdown).collect();
    append_to("markdown", path, &text)
}

/// Reads a JSON-lines log back into turns. Blank lines are skipped.
pub fn read_log(path: &Path) -> Result<Vec<Turn>, TranscriptError> {
    let content = fs::read_to_string(path).map_err(|source| TranscriptError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str(line).map_err(|source| TranscriptError::Parse {
                line: i + 1,
                source,
            })
        })
        .collect()
}

/// Best-effort writer for the configured transcript destinations.
#[derive(Debug, Clone, Default)]
pub struct TranscriptLogger {
    log_file: Option<PathBuf>,
    markdown_file: Option<PathBuf>,
}

impl TranscriptLogger {
    pub fn new(log_file: Option<PathBuf>, markdown_file: Option<PathBuf>) -> Self {
        Self {
            log_file,
            markdown_file,
        }
    }

    /// Appends `turns` to every destination.
    ///
    /// A failing destination does not prevent writing the other one. All
    /// failures are returned for the caller to report.
    pub fn append(&self, turns: &[Turn]) -> Vec<TranscriptError> {
        let mut errors = Vec::new();

        if let Some(path) = &self.log_file {
            debug!(path = %path.display(), count = turns.len(), "Appending to log");
            if let Err(e) = log_conversation(path, turns) {
                errors.push(e);
            }
        }

        if let Some(path) = &self.markdown_file {
            debug!(path = %path.display(), count = turns.len(), "Appending to transcript");
            if let Err(e) = write_markdown(path, turns) {
                errors.push(e);
            }
        }

        errors
    }
}
