//! Error types for gemchat
//!
//! This module defines all error types used throughout the application,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for gemchat operations
///
/// This enum encompasses the errors that can occur while loading
/// configuration, talking to the Gemini API, persisting state, and
/// mutating conversations or presets.
#[derive(Error, Debug)]
pub enum GemchatError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Provider-related errors (API calls, bad status codes, parse failures)
    #[error("Provider error: {0}")]
    Provider(String),

    /// No API key could be resolved for the provider
    #[error("Missing credentials for provider: {0}")]
    MissingCredentials(String),

    /// The provider answered but produced no text
    #[error("Provider returned an empty response")]
    EmptyResponse,

    /// Key-value storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Shared state could not be locked
    #[error("State error: {0}")]
    State(String),

    /// A conversation id (or prefix) did not resolve
    #[error("Conversation not found: {0}")]
    ConversationNotFound(String),

    /// A preset name did not resolve
    #[error("Preset not found: {0}")]
    PresetNotFound(String),

    /// A message index was outside the conversation
    #[error("Message index {index} is out of range (conversation has {len} messages)")]
    InvalidMessageIndex {
        /// The requested index
        index: usize,
        /// Number of messages in the conversation
        len: usize,
    },

    /// The requested edit or resend is not allowed for this message
    #[error("Invalid edit: {0}")]
    InvalidEdit(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Keyring/credential storage errors
    #[error("Keyring error: {0}")]
    Keyring(#[from] keyring::Error),
}

/// Result type alias for gemchat operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation.
pub type Result<T> = anyhow::Result<T>;
