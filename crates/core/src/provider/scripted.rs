//! A scripted search provider for unit testing purposes.
use crate::error::TransportError;
use crate::search::{FragmentStream, Payload, SearchProvider};
use futures::{StreamExt, stream};
use std::sync::{Arc, Mutex};

/// A `SearchProvider` that replays canned fragments.
///
/// Every call yields the configured fragments in order. When a failure
/// message is set, the stream then ends with `TransportError::Api`.
/// A stalling provider never ends its stream, like a server that stops
/// sending mid-response. Received payloads are recorded for later inspection.
#[derive(Debug, Clone, Default)]
pub struct ScriptedProvider {
    fragments: Vec<String>,
    failure: Option<String>,
    stall: bool,
    payloads: Arc<Mutex<Vec<Payload>>>,
}

impl ScriptedProvider {
    pub fn new<S: Into<String>>(fragments: impl IntoIterator<Item = S>) -> Self {
        Self {
            fragments: fragments.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Ends every stream with an error after the scripted fragments.
    pub fn failing_with(mut self, message: &str) -> Self {
        self.failure = Some(message.to_string());
        self
    }

    /// Keeps every stream open after the scripted fragments.
    pub fn stalling(mut self) -> Self {
        self.stall = true;
        self
    }

    /// Payloads received so far, in call order.
    pub fn payloads(&self) -> Vec<Payload> {
        self.payloads
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }
}

impl SearchProvider for ScriptedProvider {
    fn search(&self, payload: Payload) -> FragmentStream {
        if let Ok(mut payloads) = self.payloads.lock() {
            payloads.push(payload);
        }

        let mut items: Vec<Result<String, TransportError>> =
            self.fragments.iter().cloned().map(Ok).collect();
        if let Some(message) = &self.failure {
            items.push(Err(TransportError::Api(message.clone())));
        }
        if self.stall {
            Box::pin(stream::iter(items).chain(stream::pending()))
        } else {
            Box::pin(stream::iter(items))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SearchSettings;
    use std::time::Duration;

    fn payload(query: &str) -> Payload {
        let settings = SearchSettings {
            model: "m".to_string(),
            stream: true,
            show_citations: false,
            system_prompt: None,
        };
        Payload::build(query, &settings, &[])
    }

    #[tokio::test]
    async fn test_scripted_provider_replays_fragments_and_failure() {
        let provider = ScriptedProvider::new(["Hello"]).failing_with("API Error");
        let items: Vec<_> = provider.search(payload("q1")).collect().await;

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_ref().unwrap(), "Hello");
        assert_eq!(
            items[1].as_ref().unwrap_err().to_string(),
            "API error: API Error"
        );
    }

    #[tokio::test]
    async fn test_stalling_provider_stays_open_after_fragments() {
        let provider = ScriptedProvider::new(["Hello"]).stalling();
        let mut fragments = provider.search(payload("q1"));

        assert_eq!(fragments.next().await.unwrap().unwrap(), "Hello");
        let next = tokio::time::timeout(Duration::from_millis(50), fragments.next()).await;
        assert!(next.is_err());
    }

    #[tokio::test]
    async fn test_scripted_provider_records_payloads() {
        let provider = ScriptedProvider::new(["a", "b"]);
        let _ = provider.search(payload("q1"));
        let _ = provider.search(payload("q2"));

        let queries: Vec<_> = provider
            .payloads()
            .iter()
            .map(|p| p.messages.last().unwrap().content.clone())
            .collect();
        assert_eq!(queries, vec!["q1", "q2"]);
    }
}
