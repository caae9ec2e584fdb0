use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(super) struct ChatCompletionResponse {
    #[serde(default)]
    pub(super) choices: Vec<ChatCompletionChoice>,
    #[serde(default)]
    pub(super) citations: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ChatCompletionChoice {
    #[serde(default)]
    pub(super) message: Option<Message>,
}

#[derive(Debug, Deserialize)]
pub(super) struct Message {
    pub(super) content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ChatCompletionChunk {
    #[serde(default)]
    pub(super) choices: Vec<ChatCompletionChunkChoice>,
    pub(super) citations: Option<Vec<String>>,
    pub(super) error: Option<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ChatCompletionChunkChoice {
    #[serde(default)]
    pub(super) delta: Option<Delta>,
}

#[derive(Debug, Deserialize)]
pub(super) struct Delta {
    pub(super) content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ApiErrorBody {
    pub(super) error: Option<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ApiErrorDetail {
    pub(super) message: Option<String>,
}

impl ChatCompletionResponse {
    pub(super) fn content(&self) -> &str {
        self.choices
            .first()
            .and_then(|c| c.message.as_ref())
            .and_then(|m| m.content.as_deref())
            .unwrap_or("")
    }
}

impl ChatCompletionChunk {
    pub(super) fn delta_content(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.delta.as_ref())
            .and_then(|d| d.content.as_deref())
            .filter(|s| !s.is_empty())
    }
}
