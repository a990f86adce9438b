//! Base provider trait and common types for gemchat
//!
//! This module defines the Provider trait that the completion backend
//! implements, along with the message types shared by the conversation
//! store, the orchestrator and the API client.

use crate::error::{GemchatError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Author of a message
///
/// Serialized lowercase so it matches the role names the Gemini API expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Typed by the person at the keyboard
    User,
    /// Produced by the model (or a placeholder standing in for a reply)
    Model,
}

impl Role {
    /// Wire name of the role ("user" or "model")
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Model => "model",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => write!(f, "User"),
            Self::Model => write!(f, "Model"),
        }
    }
}

/// Message structure for conversation
///
/// A role-tagged piece of text. Messages are immutable once appended except
/// for explicit edits made through the conversation store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Who wrote the message
    pub role: Role,
    /// Message body
    pub text: String,
}

impl Message {
    /// Creates a new user message
    ///
    /// # Examples
    ///
    /// ```
    /// use gemchat::providers::{Message, Role};
    ///
    /// let msg = Message::user("Hello!");
    /// assert_eq!(msg.role, Role::User);
    /// assert_eq!(msg.text, "Hello!");
    /// ```
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    /// Creates a new model message
    ///
    /// # Examples
    ///
    /// ```
    /// use gemchat::providers::{Message, Role};
    ///
    /// let msg = Message::model("Hi there");
    /// assert_eq!(msg.role, Role::Model);
    /// ```
    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            text: text.into(),
        }
    }

    /// Returns true if the message was typed by the user
    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }
}

/// Model information returned by the model listing endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Identifier accepted by `complete` (e.g. "gemini-2.0-flash")
    pub name: String,
    /// Display name for user-friendly presentation
    pub display_name: String,
    /// Maximum prompt size in tokens, when reported
    pub input_token_limit: Option<usize>,
}

impl ModelInfo {
    /// Create a new ModelInfo instance
    ///
    /// # Examples
    ///
    /// ```
    /// use gemchat::providers::ModelInfo;
    ///
    /// let model = ModelInfo::new("gemini-2.0-flash", "Gemini 2.0 Flash");
    /// assert_eq!(model.name, "gemini-2.0-flash");
    /// assert!(model.input_token_limit.is_none());
    /// ```
    pub fn new(name: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            display_name: display_name.into(),
            input_token_limit: None,
        }
    }
}

/// Provider trait for the completion backend
///
/// Implementations turn an ordered, role-tagged history plus a system
/// instruction and a model identifier into reply text.
///
/// # Examples
///
/// ```
/// use gemchat::providers::{Message, Provider};
/// use gemchat::error::Result;
/// use async_trait::async_trait;
///
/// struct EchoProvider;
///
/// #[async_trait]
/// impl Provider for EchoProvider {
///     async fn complete(
///         &self,
///         messages: &[Message],
///         _instruction: &str,
///         _model: &str,
///     ) -> Result<String> {
///         Ok(messages.last().map(|m| m.text.clone()).unwrap_or_default())
///     }
/// }
/// ```
#[async_trait]
pub trait Provider: Send + Sync {
    /// Generate a reply for the given history
    ///
    /// # Arguments
    ///
    /// * `messages` - Conversation history, oldest first; the last entry is
    ///   the user turn being answered
    /// * `instruction` - System instruction text (may be empty)
    /// * `model` - Model identifier to target
    ///
    /// # Errors
    ///
    /// Returns `GemchatError::MissingCredentials` when no API key is set,
    /// `GemchatError::EmptyResponse` when the reply has no text, and
    /// `GemchatError::Provider` for transport or decoding failures.
    async fn complete(&self, messages: &[Message], instruction: &str, model: &str)
        -> Result<String>;

    /// List models available to the configured credential
    ///
    /// Default implementation reports that listing is unsupported.
    async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        Err(GemchatError::Provider("Model listing is not supported by this provider".to_string()).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_user() {
        let msg = Message::user("Hello");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.text, "Hello");
        assert!(msg.is_user());
    }

    #[test]
    fn test_message_model() {
        let msg = Message::model("Reply");
        assert_eq!(msg.role, Role::Model);
        assert!(!msg.is_user());
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_string(&Message::model("x")).unwrap();
        assert_eq!(json, r#"{"role":"model","text":"x"}"#);

        let msg: Message = serde_json::from_str(r#"{"role":"user","text":"hi"}"#).unwrap();
        assert_eq!(msg, Message::user("hi"));
    }

    #[test]
    fn test_role_display() {
        assert_eq!(Role::User.to_string(), "User");
        assert_eq!(Role::Model.to_string(), "Model");
    }

    #[test]
    fn test_model_info_creation() {
        let info = ModelInfo::new("gemini-1.5-pro", "Gemini 1.5 Pro");
        assert_eq!(info.name, "gemini-1.5-pro");
        assert_eq!(info.display_name, "Gemini 1.5 Pro");
    }

    #[tokio::test]
    async fn test_default_list_models_error() {
        struct MockProvider;

        #[async_trait]
        impl Provider for MockProvider {
            async fn complete(
                &self,
                _messages: &[Message],
                _instruction: &str,
                _model: &str,
            ) -> Result<String> {
                Ok("ok".to_string())
            }
        }

        let provider = MockProvider;
        assert!(provider.list_models().await.is_err());
    }
}
