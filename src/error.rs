//! Error types for the CCTV assistant

use thiserror::Error;

/// Result type alias for assistant operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the assistant
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Microphone access was refused
    #[error("microphone permission denied: {0}")]
    PermissionDenied(String),

    /// Platform lacks capture or synthesis capability
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// Text-to-speech failed on every available path
    #[error("synthesis failed: {0}")]
    SynthesisFailed(String),

    /// Language model request failed (network, auth, quota, content policy)
    #[error("dispatch failed: {0}")]
    DispatchFailed(String),

    /// Persisted history could not be decoded
    #[error("stored history is corrupt: {0}")]
    StorageCorrupt(String),

    /// Audio device error
    #[error("audio error: {0}")]
    Audio(String),

    /// Speech-to-text error
    #[error("STT error: {0}")]
    Stt(String),

    /// A widget instance already exists on this host
    #[error("widget already initialized")]
    AlreadyInitialized,

    /// No widget instance exists on this host
    #[error("widget not initialized")]
    NotInitialized,

    /// The session task has shut down
    #[error("session closed")]
    SessionClosed,

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
