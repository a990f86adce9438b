//! Provider module for gemchat
//!
//! This module contains the completion-provider abstraction, the Gemini
//! implementation, and the total boundary used by the chat orchestrator.

pub mod base;
pub mod gemini;

pub use base::{Message, ModelInfo, Provider, Role};
pub use gemini::GeminiProvider;

use crate::config::ProviderConfig;
use crate::error::{GemchatError, Result};

/// Placeholder committed when no API key is available
pub const MISSING_KEY_PLACEHOLDER: &str =
    "⚠️ API key is not set. Run `gemchat auth` or set GEMCHAT_API_KEY.";

/// Placeholder committed when the model produced no text
pub const EMPTY_RESPONSE_PLACEHOLDER: &str = "⚠️ The model returned an empty response.";

/// Prefix of the placeholder committed when the call failed
pub const ERROR_PLACEHOLDER_PREFIX: &str = "⚠️ Error: ";

/// Create the configured provider instance
///
/// # Arguments
///
/// * `config` - Provider configuration
/// * `api_key` - Resolved API key, if any
///
/// # Errors
///
/// Returns error if the HTTP client cannot be built
pub fn create_provider(config: &ProviderConfig, api_key: Option<String>) -> Result<Box<dyn Provider>> {
    Ok(Box::new(GeminiProvider::new(config, api_key)?))
}

/// Call the provider and always come back with displayable text
///
/// Failures are turned into one of three placeholder strings so the caller
/// has a single success path: the result is appended as the model message
/// whatever happened.
///
/// # Examples
///
/// ```
/// use gemchat::providers::{complete_or_placeholder, Message, Provider, MISSING_KEY_PLACEHOLDER};
/// use gemchat::error::{GemchatError, Result};
/// use async_trait::async_trait;
///
/// struct NoKey;
///
/// #[async_trait]
/// impl Provider for NoKey {
///     async fn complete(&self, _: &[Message], _: &str, _: &str) -> Result<String> {
///         Err(GemchatError::MissingCredentials("gemini".into()).into())
///     }
/// }
///
/// # tokio_test::block_on(async {
/// let text = complete_or_placeholder(&NoKey, &[Message::user("hi")], "", "m").await;
/// assert_eq!(text, MISSING_KEY_PLACEHOLDER);
/// # });
/// ```
pub async fn complete_or_placeholder(
    provider: &dyn Provider,
    messages: &[Message],
    instruction: &str,
    model: &str,
) -> String {
    match provider.complete(messages, instruction, model).await {
        Ok(text) if text.trim().is_empty() => EMPTY_RESPONSE_PLACEHOLDER.to_string(),
        Ok(text) => text,
        Err(err) => placeholder_for_error(&err),
    }
}

/// Map a provider error onto its placeholder text
pub fn placeholder_for_error(err: &anyhow::Error) -> String {
    match err.downcast_ref::<GemchatError>() {
        Some(GemchatError::MissingCredentials(_)) => MISSING_KEY_PLACEHOLDER.to_string(),
        Some(GemchatError::EmptyResponse) => EMPTY_RESPONSE_PLACEHOLDER.to_string(),
        Some(GemchatError::Provider(msg)) => format!("{}{}", ERROR_PLACEHOLDER_PREFIX, msg),
        _ => format!("{}{}", ERROR_PLACEHOLDER_PREFIX, err),
    }
}

/// Returns true if the text is one of the placeholder strings
pub fn is_placeholder(text: &str) -> bool {
    text == MISSING_KEY_PLACEHOLDER
        || text == EMPTY_RESPONSE_PLACEHOLDER
        || text.starts_with(ERROR_PLACEHOLDER_PREFIX)
}
