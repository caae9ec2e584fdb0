//! Request payload and the provider abstraction for the search API.
use futures::stream::BoxStream;
use serde::Serialize;

use crate::config::SearchSettings;
use crate::conversation::Turn;
use crate::error::TransportError;

/// Lazy sequence of response fragments. Polling it drives the remote call.
pub type FragmentStream = BoxStream<'static, Result<String, TransportError>>;

/// Body of a chat completions request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Payload {
    pub model: String,
    pub messages: Vec<Turn>,
    pub stream: bool,
    pub show_citations: bool,
}

impl Payload {
    /// Builds the request for `query` on top of the prior `context`.
    ///
    /// The system prompt (when configured) comes first, then the context in
    /// exchange order, then the new user query.
    pub fn build(query: &str, settings: &SearchSettings, context: &[Turn]) -> Self {
        let mut messages = Vec::with_capacity(context.len() + 2);
        if let Some(prompt) = settings.system_prompt.as_deref().filter(|p| !p.is_empty()) {
            messages.push(Turn::system(prompt));
        }
        messages.extend(context.iter().cloned());
        messages.push(Turn::user(query));

        Self {
            model: settings.model.clone(),
            messages,
            stream: settings.stream,
            show_citations: settings.show_citations,
        }
    }
}

/// A remote search backend.
pub trait SearchProvider: Send + Sync {
    /// Issues one request for `payload` and returns its fragments.
    ///
    /// Nothing is sent until the stream is polled. A failure ends the stream
    /// with a single `Err`; fragments yielded before it stay valid.
    fn search(&self, payload: Payload) -> FragmentStream;
}

/// Renders citation urls as a numbered references block.
pub fn format_citations(citations: &[String]) -> String {
    let refs = citations
        .iter()
        .enumerate()
        .map(|(i, url)| format!("[{}] {url}", i + 1))
        .collect::<Vec<_>>()
        .join("\n");
    format!("\n\nReferences:\n{refs}")
}
