//! Error types for the pair-voice assistant

use thiserror::Error;

/// Result type alias for pair-voice operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while running a voice session
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Audio device error
    #[error("audio error: {0}")]
    Audio(String),

    /// Speech-to-text error
    #[error("STT error: {0}")]
    Stt(String),

    /// Text-to-speech error
    #[error("TTS error: {0}")]
    Tts(String),

    /// Wake word detection error
    #[error("wake word error: {0}")]
    WakeWord(String),

    /// Text completion (LLM) error
    #[error("completion error: {0}")]
    Completion(String),

    /// External code review error
    #[error("review error: {0}")]
    Review(String),

    /// Clipboard access error
    #[error("clipboard error: {0}")]
    Clipboard(String),

    /// Workspace file access error (invalid or escaping paths)
    #[error("workspace error: {0}")]
    Workspace(String),

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
