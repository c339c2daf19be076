//! Error types for the Arca gateway

use thiserror::Error;
use uuid::Uuid;

/// Result type alias for Arca operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the Arca gateway
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Malformed input at a boundary (empty content, empty audio, ...)
    #[error("validation error: {0}")]
    Validation(String),

    /// Mutation attempted on a deactivated conversation
    #[error("conversation {0} is inactive")]
    InactiveConversation(Uuid),

    /// Mutation addressed at an untracked session id
    #[error("session not found: {0}")]
    SessionNotFound(Uuid),

    /// Speech-to-text collaborator error
    #[error("STT error: {0}")]
    Stt(String),

    /// Language-model collaborator error
    #[error("LLM error: {0}")]
    Llm(String),

    /// Text-to-speech collaborator error
    #[error("TTS error: {0}")]
    Tts(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Error {
    /// Pipeline stage this error is attributed to, if it is a collaborator
    /// failure
    #[must_use]
    pub const fn stage(&self) -> Option<&'static str> {
        match self {
            Self::Stt(_) => Some("stt"),
            Self::Llm(_) => Some("llm"),
            Self::Tts(_) => Some("tts"),
            _ => None,
        }
    }
}
