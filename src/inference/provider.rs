use std::fmt;

use async_trait::async_trait;

use super::types::{GeneratedTurn, GenerationRequest};

/// Errors a generation backend can report.
/// The session collapses all of them into a single `GenerationFailure`.
#[derive(Debug)]
pub enum GenerationError {
    /// Backend misconfigured (missing API key, bad URL).
    Config(String),
    /// Network-level failure (timeout, DNS, connection refused).
    Network(String),
    /// API returned an error response.
    Api { status: u16, message: String },
    /// Failed to parse the backend's response.
    Parse(String),
    /// The backend answered with nothing usable.
    EmptyResponse,
    /// Reading an attachment's payload failed.
    Attachment { name: String, message: String },
}

impl fmt::Display for GenerationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationError::Config(msg) => write!(f, "config error: {msg}"),
            GenerationError::Network(msg) => write!(f, "network error: {msg}"),
            GenerationError::Api { status, message } => {
                write!(f, "API error (HTTP {status}): {message}")
            }
            GenerationError::Parse(msg) => write!(f, "parse error: {msg}"),
            GenerationError::EmptyResponse => write!(f, "empty response"),
            GenerationError::Attachment { name, message } => {
                write!(f, "could not read attachment '{name}': {message}")
            }
        }
    }
}

impl std::error::Error for GenerationError {}

/// The injected capability that turns a user turn into an assistant turn.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Returns the name of the backend.
    fn name(&self) -> &str;

    /// Produces the assistant turn answering `request.user_turn`.
    async fn generate(&self, request: GenerationRequest) -> Result<GeneratedTurn, GenerationError>;
}
