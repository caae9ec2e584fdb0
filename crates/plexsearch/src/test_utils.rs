//! Test utilities for the plexsearch binary.
//!
//! Provides an in-memory [`OutputSink`], scripted prompt input and temporary
//! config files so that sessions can be driven without a terminal.

use std::collections::VecDeque;
use std::fs;
use std::path::PathBuf;

use anyhow::Result;
use tempfile::{Builder, TempDir};

use crate::cli::chat::{InputEvent, PromptInput};
use crate::cli::ux::OutputSink;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkEvent {
    Print(String),
    Live(String),
    FinishLive,
    ProgressStart(String),
    ProgressStop,
    Error(String),
    Warning(String),
    Info(String),
    Diagnostic(String),
}

/// `OutputSink` that records every call.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub events: Vec<SinkEvent>,
}

impl RecordingSink {
    /// Text the user would see as the response: the last printed block or the
    /// last state of the live region, whichever came later.
    pub fn displayed(&self) -> String {
        self.events
            .iter()
            .rev()
            .find_map(|event| match event {
                SinkEvent::Print(text) | SinkEvent::Live(text) => Some(text.clone()),
                _ => None,
            })
            .unwrap_or_default()
    }

    pub fn live_updates(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, SinkEvent::Live(_)))
            .count()
    }

    pub fn errors(&self) -> Vec<String> {
        self.events
            .iter()
            .filter_map(|e| match e {
                SinkEvent::Error(m) => Some(m.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.events
            .iter()
            .filter_map(|e| match e {
                SinkEvent::Warning(m) => Some(m.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn diagnostics(&self) -> Vec<String> {
        self.events
            .iter()
            .filter_map(|e| match e {
                SinkEvent::Diagnostic(m) => Some(m.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn infos(&self) -> Vec<String> {
        self.events
            .iter()
            .filter_map(|e| match e {
                SinkEvent::Info(m) => Some(m.clone()),
                _ => None,
            })
            .collect()
    }
}

impl OutputSink for RecordingSink {
    fn print(&mut self, text: &str) {
        self.events.push(SinkEvent::Print(text.to_string()));
    }

    fn update_live(&mut self, text: &str) {
        self.events.push(SinkEvent::Live(text.to_string()));
    }

    fn finish_live(&mut self) {
        self.events.push(SinkEvent::FinishLive);
    }

    fn start_progress(&mut self, message: &str) {
        self.events.push(SinkEvent::ProgressStart(message.to_string()));
    }

    fn stop_progress(&mut self) {
        self.events.push(SinkEvent::ProgressStop);
    }

    fn error(&mut self, message: &str) {
        self.events.push(SinkEvent::Error(message.to_string()));
    }

    fn warning(&mut self, message: &str) {
        self.events.push(SinkEvent::Warning(message.to_string()));
    }

    fn info(&mut self, message: &str) {
        self.events.push(SinkEvent::Info(message.to_string()));
    }

    fn diagnostic(&mut self, message: &str) {
        self.events.push(SinkEvent::Diagnostic(message.to_string()));
    }
}

/// `PromptInput` replaying canned events, then reporting end of input.
#[derive(Debug, Default)]
pub struct ScriptedInput {
    events: VecDeque<InputEvent>,
}

impl ScriptedInput {
    pub fn lines<'a>(lines: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            events: lines
                .into_iter()
                .map(|l| InputEvent::Line(l.to_string()))
                .collect(),
        }
    }

    pub fn then(mut self, event: InputEvent) -> Self {
        self.events.push_back(event);
        self
    }
}

impl PromptInput for ScriptedInput {
    fn read_line(&mut self, _prompt: &str) -> Result<InputEvent> {
        Ok(self.events.pop_front().unwrap_or(InputEvent::Eof))
    }
}

/// Writes a config file pointing at `server_uri` into a fresh temp dir.
///
/// # Panics
/// Panics if the temp directory or the file cannot be created.
pub fn create_temp_config_file(server_uri: &str) -> (TempDir, PathBuf) {
    let temp_dir = Builder::new()
        .prefix("plexsearch-test")
        .rand_bytes(8)
        .tempdir()
        .unwrap();
    let config_path = temp_dir.path().join("plexsearch.yml");
    let config_content = format!(
        r#"
base_url: "{server_uri}"
api_key: "MOCK_API_KEY"
model: small
stream: true
citations: false
system_prompt: "You are a technical assistant."
models:
  small: sonar-small-online
"#,
    );
    fs::write(&config_path, config_content).unwrap();
    (temp_dir, config_path)
}
