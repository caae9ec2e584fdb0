use crate::error::TransportError;
use crate::search::{FragmentStream, Payload, SearchProvider, format_citations};
use eventsource_stream::{EventStreamError, Eventsource};
use futures::StreamExt;
use reqwest::{Client, Response, StatusCode};
use tracing::{debug, warn};

use super::perplexity_types::{ApiErrorBody, ChatCompletionChunk, ChatCompletionResponse};

pub const DEFAULT_BASE_URL: &str = "https://api.perplexity.ai";

/// Client for the Perplexity chat completions endpoint.
#[derive(Debug, Clone)]
pub struct PerplexityProvider {
    endpoint: String,
    api_key: String,
    client: Client,
}

impl PerplexityProvider {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self {
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            api_key: api_key.to_string(),
            client: Client::new(),
        }
    }
}

async fn error_from_response(response: Response) -> TransportError {
    match response.status() {
        StatusCode::UNAUTHORIZED => TransportError::Authentication,
        StatusCode::TOO_MANY_REQUESTS => TransportError::RateLimited,
        StatusCode::INTERNAL_SERVER_ERROR => TransportError::Server,
        status => {
            let message = response
                .json::<ApiErrorBody>()
                .await
                .ok()
                .and_then(|b| b.error)
                .and_then(|e| e.message)
                .filter(|m| !m.is_empty());
            TransportError::Status {
                status: status.as_u16(),
                message,
            }
        }
    }
}

fn from_event_error(err: EventStreamError<reqwest::Error>) -> TransportError {
    match err {
        EventStreamError::Transport(e) => TransportError::Request(e),
        other => TransportError::Malformed(other.to_string()),
    }
}

impl SearchProvider for PerplexityProvider {
    fn search(&self, payload: Payload) -> FragmentStream {
        let client = self.client.clone();
        let endpoint = self.endpoint.clone();
        let api_key = self.api_key.clone();

        let stream = async_stream::stream! {
            debug!(
                "payload: {}",
                serde_json::to_string_pretty(&payload).unwrap_or_default()
            );

            let response = match client
                .post(&endpoint)
                .bearer_auth(&api_key)
                .json(&payload)
                .send()
                .await
            {
                Ok(response) => response,
                Err(err) => {
                    yield Err(TransportError::Request(err));
                    return;
                }
            };

            if !response.status().is_success() {
                let err = error_from_response(response).await;
                warn!("Search request failed: {err}");
                yield Err(err);
                return;
            }

            if payload.stream {
                let mut events = response.bytes_stream().eventsource();
                let mut citations: Vec<String> = Vec::new();

                while let Some(event) = events.next().await {
                    let event = match event {
                        Ok(event) => event,
                        Err(err) => {
                            yield Err(from_event_error(err));
                            return;
                        }
                    };

                    let data = event.data.trim();
                    if data == "[DONE]" {
                        break;
                    }
                    if data.is_empty() {
                        continue;
                    }

                    let chunk: ChatCompletionChunk = match serde_json::from_str(data) {
                        Ok(chunk) => chunk,
                        Err(err) => {
                            yield Err(TransportError::Malformed(format!("{err}, data: {data}")));
                            return;
                        }
                    };

                    if let Some(api_error) = &chunk.error {
                        let message = api_error
                            .message
                            .clone()
                            .unwrap_or_else(|| "An error occurred during streaming".to_string());
                        yield Err(TransportError::Api(message));
                        return;
                    }

                    let text = chunk.delta_content().map(str::to_string);
                    if let Some(text) = text {
                        yield Ok(text);
                    }

                    // Later chunks repeat the full list, keep the latest.
                    if let Some(latest) = chunk.citations {
                        citations = latest;
                    }
                }

                if payload.show_citations && !citations.is_empty() {
                    yield Ok(format_citations(&citations));
                }
            } else {
                let body = match response.bytes().await {
                    Ok(body) => body,
                    Err(err) => {
                        yield Err(TransportError::Request(err));
                        return;
                    }
                };

                let parsed: ChatCompletionResponse = match serde_json::from_slice(&body) {
                    Ok(parsed) => parsed,
                    Err(err) => {
                        yield Err(TransportError::Malformed(err.to_string()));
                        return;
                    }
                };

                let mut content = parsed.content().to_string();
                if payload.show_citations && !parsed.citations.is_empty() {
                    content.push_str(&format_citations(&parsed.citations));
                }
                yield Ok(content);
            }
        };

        Box::pin(stream)
    }
}
