use std::future::Future;
use std::sync::Arc;

use plexsearch_core::config::SearchSettings;
use plexsearch_core::conversation::Conversation;
use plexsearch_core::error::TransportError;
use plexsearch_core::search::{Payload, SearchProvider};
use plexsearch_core::transcript::TranscriptLogger;
use tracing::{debug, instrument, warn};

use crate::cli::ux::{OutputSink, RenderMode, ResponseRenderer};

/// Result of a turn that may be cut short by the user.
#[derive(Debug)]
pub enum TurnOutcome {
    Completed(Result<String, TransportError>),
    Interrupted,
}

/// A search conversation with accumulated context.
///
/// Each successful turn adds the user query and the full assistant response
/// to the context, which is sent along with every later query.
pub struct ConversationSession<S: OutputSink> {
    provider: Arc<dyn SearchProvider>,
    settings: SearchSettings,
    renderer: ResponseRenderer,
    context: Conversation,
    transcript: TranscriptLogger,
    sink: S,
}

impl<S: OutputSink> ConversationSession<S> {
    pub fn new(
        provider: Arc<dyn SearchProvider>,
        settings: SearchSettings,
        transcript: TranscriptLogger,
        sink: S,
    ) -> Self {
        let renderer = ResponseRenderer::new(RenderMode::from_stream_flag(settings.stream));
        Self {
            provider,
            settings,
            renderer,
            context: Conversation::new(),
            transcript,
            sink,
        }
    }

    #[cfg(test)]
    pub fn with_renderer(mut self, renderer: ResponseRenderer) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn context(&self) -> &Conversation {
        &self.context
    }

    #[cfg(test)]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Runs one query to completion and returns the response text.
    ///
    /// The response is rendered while it arrives. On failure the error has
    /// already been shown and the context is left untouched.
    #[instrument(skip(self), fields(model = %self.settings.model))]
    pub async fn run_turn(&mut self, query: &str) -> Result<String, TransportError> {
        let payload = Payload::build(query, &self.settings, self.context.turns());
        debug!(messages = payload.messages.len(), "Sending search request");

        let fragments = self.provider.search(payload);
        let response = self
            .renderer
            .render(fragments, &mut self.sink)
            .await
            .into_result()?;

        self.context.push_user(query);
        self.context.push_assistant(&response);

        let exchange = &self.context.turns()[self.context.len() - 2..];
        for err in self.transcript.append(exchange) {
            warn!("Transcript write failed: {err}");
            self.sink.warning(&err.to_string());
        }

        Ok(response)
    }

    /// Like [`Self::run_turn`], abandoning the turn as soon as `interrupt`
    /// resolves. An interrupted turn leaves the context untouched.
    pub async fn run_turn_until<F>(&mut self, query: &str, interrupt: F) -> TurnOutcome
    where
        F: Future,
    {
        let completed = tokio::select! {
            biased;
            _ = interrupt => None,
            result = self.run_turn(query) => Some(result),
        };

        match completed {
            Some(result) => TurnOutcome::Completed(result),
            None => {
                debug!("Turn interrupted");
                self.sink.stop_progress();
                self.sink.finish_live();
                TurnOutcome::Interrupted
            }
        }
    }
}
