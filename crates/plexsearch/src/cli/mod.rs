//! Plexsearch cli definition and entrypoint.
pub mod chat;
mod run;
pub mod ux;

use std::future::Future;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use plexsearch_core::config::{Overrides, env_var, get_config};
use plexsearch_core::get_search_provider;
use plexsearch_core::transcript::TranscriptLogger;
use tracing::{debug, info, warn};

use crate::cli::chat::LoopExit;
use crate::cli::run::RunOutcome;
use crate::cli::ux::{OutputSink, TerminalSink};
use crate::log::setup_logging;
use crate::svc::session::ConversationSession;

const INTERRUPTED_MESSAGE: &str = "Search interrupted by user";

/// Plexsearch - search the web with Perplexity from the terminal.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Query to search. Starts interactive mode when omitted.
    query: Vec<String>,

    /// Perplexity API key, overrides the config and environment.
    #[arg(long)]
    api_key: Option<String>,

    /// Model alias from the config or a model identifier.
    #[arg(short, long)]
    model: Option<String>,

    /// Print the response once it is complete.
    #[arg(long)]
    no_stream: bool,

    /// Show numbered citations after the response.
    #[arg(short, long)]
    citations: bool,

    /// Append each exchange as JSON lines to this file.
    #[arg(short, long)]
    log_file: Option<String>,

    /// Append each exchange to this Markdown transcript.
    #[arg(short = 'f', long)]
    markdown_file: Option<String>,

    /// Path to the configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write debug logs to the data directory.
    #[arg(short, long)]
    debug: bool,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            api_key: self.api_key.clone(),
            model: self.model.clone(),
            no_stream: self.no_stream,
            citations: self.citations,
            log_file: self.log_file.clone(),
            markdown_file: self.markdown_file.clone(),
        }
    }

    /// The query words joined by spaces, or `None` for interactive mode.
    fn query(&self) -> Option<String> {
        let query = self.query.join(" ");
        let query = query.trim();
        (!query.is_empty()).then(|| query.to_string())
    }
}

/// Resolves when `signal` fires. A signal that cannot be listened for never
/// fires, so a missing handler is not mistaken for a user interrupt.
async fn interrupt_from<F>(signal: F)
where
    F: Future<Output = std::io::Result<()>>,
{
    if let Err(e) = signal.await {
        warn!("Failed to listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
}

/// Resolves on Ctrl-C.
pub(crate) async fn wait_for_interrupt() {
    interrupt_from(tokio::signal::ctrl_c()).await
}

/// Runs the main CLI application.
pub async fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    if cli.debug {
        setup_logging().context("Failed to set up logging")?;
    }

    let code = match execute_cli(cli, TerminalSink::stdout()).await? {
        RunOutcome::Failed => ExitCode::FAILURE,
        RunOutcome::Success | RunOutcome::Interrupted => ExitCode::SUCCESS,
    };
    Ok(code)
}

/// Resolves the configuration, then runs a single query or the interactive
/// loop on `sink`.
async fn execute_cli<S: OutputSink>(cli: Cli, sink: S) -> Result<RunOutcome> {
    let config = get_config(cli.config.clone()).context("Failed to load configuration")?;
    let resolved = config
        .resolve(&cli.overrides(), &env_var)
        .context("Failed to resolve configuration")?;
    debug!(
        model = %resolved.search.model,
        stream = resolved.search.stream,
        "Configuration resolved"
    );

    let provider = get_search_provider(&resolved);
    let transcript = TranscriptLogger::new(resolved.log_file, resolved.markdown_file);
    let mut session = ConversationSession::new(provider, resolved.search, transcript, sink);

    let outcome = match cli.query() {
        Some(query) => run::execute(&mut session, &query).await,
        None => match chat::execute(&mut session).await? {
            LoopExit::Interrupted => RunOutcome::Interrupted,
            LoopExit::Exit | LoopExit::Eof => RunOutcome::Success,
        },
    };

    if outcome == RunOutcome::Interrupted {
        info!("Interrupted by user");
        session.sink_mut().warning(INTERRUPTED_MESSAGE);
    }
    Ok(outcome)
}
