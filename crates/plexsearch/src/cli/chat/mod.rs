use anyhow::{Context, Result};

use crate::cli::ux::OutputSink;
use crate::svc::session::ConversationSession;

mod repl;

pub use repl::{EditorInput, InputEvent, LoopExit, PromptInput, run};

/// Starts the interactive loop on the terminal.
pub async fn execute<S: OutputSink>(session: &mut ConversationSession<S>) -> Result<LoopExit> {
    let mut input = EditorInput::new().context("Failed to initialize line editor")?;
    run(session, &mut input).await
}
