use std::path::PathBuf;

use thiserror::Error;

/// Failure of a call to the remote search API.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Authentication failed. Please check your API key.")]
    Authentication,
    #[error("Rate limit exceeded. Please wait before making more requests.")]
    RateLimited,
    #[error("Perplexity API server error. Please try again later.")]
    Server,
    #[error("API request failed with status code {status}{}", detail(.message))]
    Status { status: u16, message: Option<String> },
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Malformed response: {0}")]
    Malformed(String),
    #[error("API error: {0}")]
    Api(String),
}

fn detail(message: &Option<String>) -> String {
    message
        .as_deref()
        .map(|m| format!(": {m}"))
        .unwrap_or_default()
}

/// Failure while persisting or reading a conversation transcript.
#[derive(Error, Debug)]
pub enum TranscriptError {
    #[error("Error writing to {kind} file {}: {source}", .path.display())]
    Write {
        kind: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Error serializing turn: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("Error reading log file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid log record on line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_message() {
        let err = TransportError::Status {
            status: 400,
            message: Some("Invalid model".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "API request failed with status code 400: Invalid model"
        );

        let err = TransportError::Status {
            status: 404,
            message: None,
        };
        assert_eq!(err.to_string(), "API request failed with status code 404");
    }

    #[test]
    fn test_write_error_names_destination() {
        let err = TranscriptError::Write {
            kind: "markdown",
            path: PathBuf::from("/nonexistent/plex.md"),
            source: std::io::Error::other("Test error"),
        };
        assert_eq!(
            err.to_string(),
            "Error writing to markdown file /nonexistent/plex.md: Test error"
        );
    }
}
