use std::time::Duration;

use futures::StreamExt;
use plexsearch_core::error::TransportError;
use plexsearch_core::search::FragmentStream;
use tokio::time::MissedTickBehavior;
use tracing::debug;

use super::sink::OutputSink;

/// Minimum time between two redraws of a streaming response.
pub const REFRESH_INTERVAL: Duration = Duration::from_millis(100);

const PROGRESS_MESSAGE: &str = "Searching...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// Wait for the whole response, then print it once.
    Buffered,
    /// Redraw the response in place as fragments arrive.
    Streaming,
}

impl RenderMode {
    pub fn from_stream_flag(stream: bool) -> Self {
        if stream {
            RenderMode::Streaming
        } else {
            RenderMode::Buffered
        }
    }
}

/// Text accumulated from a fragment stream.
///
/// When `error` is set the stream failed and `text` is incomplete.
#[derive(Debug)]
pub struct RenderedResponse {
    pub text: String,
    pub error: Option<TransportError>,
}

impl RenderedResponse {
    pub fn into_result(self) -> Result<String, TransportError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.text),
        }
    }
}

/// Renders a fragment stream to an [`OutputSink`].
#[derive(Debug, Clone)]
pub struct ResponseRenderer {
    mode: RenderMode,
    refresh_interval: Duration,
}

impl ResponseRenderer {
    pub fn new(mode: RenderMode) -> Self {
        Self {
            mode,
            refresh_interval: REFRESH_INTERVAL,
        }
    }

    #[cfg(test)]
    pub fn with_refresh_interval(mut self, refresh_interval: Duration) -> Self {
        self.refresh_interval = refresh_interval;
        self
    }

    /// Consumes `fragments` and returns the accumulated text.
    ///
    /// A stream failure is shown on the sink and handed back in the result,
    /// never propagated.
    pub async fn render(
        &self,
        fragments: FragmentStream,
        sink: &mut dyn OutputSink,
    ) -> RenderedResponse {
        match self.mode {
            RenderMode::Buffered => self.render_buffered(fragments, sink).await,
            RenderMode::Streaming => self.render_streaming(fragments, sink).await,
        }
    }

    async fn render_buffered(
        &self,
        mut fragments: FragmentStream,
        sink: &mut dyn OutputSink,
    ) -> RenderedResponse {
        sink.start_progress(PROGRESS_MESSAGE);

        let mut text = String::new();
        let mut error = None;
        while let Some(fragment) = fragments.next().await {
            match fragment {
                Ok(fragment) => text.push_str(&fragment),
                Err(err) => {
                    error = Some(err);
                    break;
                }
            }
        }

        sink.stop_progress();
        if error.is_none() || !text.is_empty() {
            sink.print(&text);
        }
        if let Some(err) = &error {
            sink.error(&err.to_string());
        }

        RenderedResponse { text, error }
    }

    async fn render_streaming(
        &self,
        mut fragments: FragmentStream,
        sink: &mut dyn OutputSink,
    ) -> RenderedResponse {
        let mut ticker = tokio::time::interval(self.refresh_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut text = String::new();
        let mut error = None;
        // Buffer changed since the last redraw
        let mut dirty = false;
        let mut redraws = 0usize;

        loop {
            tokio::select! {
                next = fragments.next() => match next {
                    Some(Ok(fragment)) => {
                        text.push_str(&fragment);
                        dirty = true;
                    }
                    Some(Err(err)) => {
                        error = Some(err);
                        break;
                    }
                    None => break,
                },
                _ = ticker.tick() => {
                    if dirty {
                        sink.update_live(&text);
                        dirty = false;
                        redraws += 1;
                    }
                }
            }
        }

        if dirty {
            sink.update_live(&text);
            redraws += 1;
        }
        sink.finish_live();
        debug!(redraws, len = text.len(), "Streaming render finished");

        if let Some(err) = &error {
            sink.error(&err.to_string());
        }

        RenderedResponse { text, error }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{RecordingSink, SinkEvent};
    use plexsearch_core::ScriptedProvider;
    use plexsearch_core::config::SearchSettings;
    use plexsearch_core::search::{Payload, SearchProvider};

    fn fragments(provider: &ScriptedProvider) -> FragmentStream {
        let settings = SearchSettings {
            model: "test-model".to_string(),
            stream: true,
            show_citations: false,
            system_prompt: None,
        };
        provider.search(Payload::build("q", &settings, &[]))
    }

    #[tokio::test]
    async fn test_buffered_render_prints_concatenation_once() {
        let provider = ScriptedProvider::new(["Hello", " ", "World"]);
        let mut sink = RecordingSink::default();

        let rendered = ResponseRenderer::new(RenderMode::Buffered)
            .render(fragments(&provider), &mut sink)
            .await;

        assert_eq!(rendered.text, "Hello World");
        assert!(rendered.error.is_none());
        assert_eq!(
            sink.events,
            vec![
                SinkEvent::ProgressStart("Searching...".to_string()),
                SinkEvent::ProgressStop,
                SinkEvent::Print("Hello World".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_streaming_render_final_text_is_concatenation() {
        let provider = ScriptedProvider::new(["Hello", " World", "!"]);
        let mut sink = RecordingSink::default();

        let rendered = ResponseRenderer::new(RenderMode::Streaming)
            .render(fragments(&provider), &mut sink)
            .await;

        assert_eq!(rendered.text, "Hello World!");
        assert_eq!(sink.displayed(), "Hello World!");
        assert_eq!(sink.events.last(), Some(&SinkEvent::FinishLive));
        assert!(sink.errors().is_empty());
    }

    #[tokio::test]
    async fn test_streaming_render_coalesces_fast_fragments() {
        let parts: Vec<String> = (0..100).map(|i| format!("{i},")).collect();
        let provider = ScriptedProvider::new(parts.clone());
        let mut sink = RecordingSink::default();

        let rendered = ResponseRenderer::new(RenderMode::Streaming)
            .with_refresh_interval(Duration::from_secs(3600))
            .render(fragments(&provider), &mut sink)
            .await;

        assert_eq!(rendered.text, parts.concat());
        assert_eq!(sink.displayed(), parts.concat());
        assert!(sink.live_updates() <= 2, "too many redraws: {:?}", sink.events);
    }

    #[tokio::test]
    async fn test_streaming_render_error_keeps_partial_text() {
        let provider = ScriptedProvider::new(["Hello"]).failing_with("connection reset");
        let mut sink = RecordingSink::default();

        let rendered = ResponseRenderer::new(RenderMode::Streaming)
            .render(fragments(&provider), &mut sink)
            .await;

        assert_eq!(rendered.text, "Hello");
        assert!(rendered.error.is_some());
        assert_eq!(sink.displayed(), "Hello");
        assert_eq!(sink.errors(), vec!["API error: connection reset".to_string()]);
        assert!(rendered.into_result().is_err());
    }

    #[tokio::test]
    async fn test_buffered_render_error_without_text() {
        let provider = ScriptedProvider::new(Vec::<String>::new()).failing_with("boom");
        let mut sink = RecordingSink::default();

        let rendered = ResponseRenderer::new(RenderMode::Buffered)
            .render(fragments(&provider), &mut sink)
            .await;

        assert_eq!(rendered.text, "");
        assert_eq!(
            sink.events,
            vec![
                SinkEvent::ProgressStart("Searching...".to_string()),
                SinkEvent::ProgressStop,
                SinkEvent::Error("API error: boom".to_string()),
            ]
        );
    }

    #[test]
    fn test_render_mode_from_stream_flag() {
        assert_eq!(RenderMode::from_stream_flag(true), RenderMode::Streaming);
        assert_eq!(RenderMode::from_stream_flag(false), RenderMode::Buffered);
    }
}
