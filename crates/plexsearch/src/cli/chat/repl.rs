use anyhow::Result;
use rustyline::error::ReadlineError;
use rustyline::{DefaultEditor, EditMode};
use tracing::{debug, error};

use crate::cli::ux::{ChatMessageType, OutputSink, style_chat_text};
use crate::cli::wait_for_interrupt;
use crate::svc::session::{ConversationSession, TurnOutcome};

const EXIT_COMMAND: &str = "exit";

/// One read from the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    Line(String),
    /// Ctrl-C at the prompt.
    Interrupted,
    /// Ctrl-D or closed stdin.
    Eof,
}

/// Source of interactive queries.
pub trait PromptInput {
    fn read_line(&mut self, prompt: &str) -> Result<InputEvent>;
}

/// Line editor with in-memory history.
pub struct EditorInput {
    editor: DefaultEditor,
}

impl EditorInput {
    pub fn new() -> Result<Self> {
        let config = rustyline::Config::builder()
            .history_ignore_dups(true)?
            .history_ignore_space(true)
            .auto_add_history(true)
            .edit_mode(EditMode::Emacs)
            .build();
        Ok(Self {
            editor: DefaultEditor::with_config(config)?,
        })
    }
}

impl PromptInput for EditorInput {
    fn read_line(&mut self, prompt: &str) -> Result<InputEvent> {
        match self.editor.readline(prompt) {
            Ok(line) => Ok(InputEvent::Line(line)),
            Err(ReadlineError::Interrupted) => Ok(InputEvent::Interrupted),
            Err(ReadlineError::Eof) => Ok(InputEvent::Eof),
            Err(err) => Err(err.into()),
        }
    }
}

/// Why the interactive loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    /// The user typed `exit`.
    Exit,
    Eof,
    /// Ctrl-C, either at the prompt or during a search.
    Interrupted,
}

fn is_exit_command(line: &str) -> bool {
    line.trim().eq_ignore_ascii_case(EXIT_COMMAND)
}

/// Reads queries until `exit`, end of input or an interrupt.
///
/// A failed search does not end the loop; the error is shown and the next
/// query is read.
pub async fn run<S, I>(session: &mut ConversationSession<S>, input: &mut I) -> Result<LoopExit>
where
    S: OutputSink,
    I: PromptInput,
{
    session
        .sink_mut()
        .info("Entering interactive mode. Type 'exit' to quit.");
    let prompt = format!("\n{}", style_chat_text("> ", ChatMessageType::Prompt));

    loop {
        let line = match input.read_line(&prompt)? {
            InputEvent::Line(line) => line,
            InputEvent::Interrupted => return Ok(LoopExit::Interrupted),
            InputEvent::Eof => return Ok(LoopExit::Eof),
        };

        let query = line.trim();
        if query.is_empty() {
            session
                .sink_mut()
                .info("Please enter a query or type 'exit' to quit.");
            continue;
        }
        if is_exit_command(query) {
            session.sink_mut().info("Exiting interactive mode.");
            return Ok(LoopExit::Exit);
        }

        debug!(query, context = session.context().len(), "Running interactive turn");
        match session
            .run_turn_until(query, wait_for_interrupt())
            .await
        {
            TurnOutcome::Completed(Ok(_)) => {}
            TurnOutcome::Completed(Err(err)) => {
                error!("Search failed: {err}");
                session.sink_mut().diagnostic(&format!("Search failed: {err}"));
            }
            TurnOutcome::Interrupted => return Ok(LoopExit::Interrupted),
        }
    }
}
