use tracing::error;

use crate::cli::ux::OutputSink;
use crate::cli::wait_for_interrupt;
use crate::svc::session::{ConversationSession, TurnOutcome};

/// How a single-shot search ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Success,
    Failed,
    Interrupted,
}

/// Runs `query` once. The response or the error is shown on the session's
/// sink as it happens.
pub async fn execute<S: OutputSink>(session: &mut ConversationSession<S>, query: &str) -> RunOutcome {
    let outcome = session
        .run_turn_until(query, wait_for_interrupt())
        .await;

    match outcome {
        TurnOutcome::Completed(Ok(_)) => RunOutcome::Success,
        TurnOutcome::Completed(Err(err)) => {
            error!("Search failed: {err}");
            RunOutcome::Failed
        }
        TurnOutcome::Interrupted => RunOutcome::Interrupted,
    }
}
