//! Test utilities for gemchat
//!
//! This module provides common test utilities including assertion helpers,
//! in-memory state and in-process providers that stand in for the Gemini
//! API.

use crate::error::{GemchatError, Result};
use crate::providers::{Message, Provider};
use crate::state::AppState;
use crate::storage::{MemoryStorage, Persistence};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::Notify;

/// Assert that an error contains the expected message
///
/// # Panics
///
/// Panics if the result is Ok or if the error doesn't contain the expected message
pub fn assert_error_contains<T>(result: Result<T>, expected: &str) {
    match result {
        Ok(_) => panic!("Expected error containing '{}' but got Ok", expected),
        Err(e) => {
            let error_msg = e.to_string();
            assert!(
                error_msg.contains(expected),
                "Error message '{}' does not contain '{}'",
                error_msg,
                expected
            );
        }
    }
}

/// Fresh in-memory application state
pub fn memory_state() -> AppState {
    AppState::load(Persistence::new(MemoryStorage::new()), "gemini-test")
}

/// Provider that answers with queued replies, one per call
///
/// Once the queue is exhausted every call fails with a provider error.
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<std::result::Result<String, GemchatError>>>,
    calls: AtomicUsize,
}

impl ScriptedProvider {
    /// Queue successful replies
    pub fn replies(replies: &[&str]) -> Self {
        Self {
            replies: Mutex::new(replies.iter().map(|r| Ok(r.to_string())).collect()),
            calls: AtomicUsize::new(0),
        }
    }

    /// A provider that always reports a missing API key
    pub fn missing_key() -> Self {
        Self {
            replies: Mutex::new(VecDeque::from(vec![Err(GemchatError::MissingCredentials(
                "gemini".to_string(),
            ))])),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of completed calls
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    async fn complete(&self, _messages: &[Message], _instruction: &str, _model: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self
            .replies
            .lock()
            .map_err(|_| GemchatError::Provider("script lock poisoned".to_string()))?
            .pop_front();
        match next {
            Some(Ok(text)) => Ok(text),
            Some(Err(e)) => Err(e.into()),
            None => Err(GemchatError::Provider("no scripted reply left".to_string()).into()),
        }
    }
}

/// Provider that describes its inputs instead of answering
pub struct EchoProvider;

#[async_trait]
impl Provider for EchoProvider {
    async fn complete(&self, messages: &[Message], instruction: &str, model: &str) -> Result<String> {
        let last = messages.last().map(|m| m.text.as_str()).unwrap_or_default();
        Ok(format!(
            "model={} instruction={} last={} count={}",
            model,
            instruction,
            last,
            messages.len()
        ))
    }
}

/// Provider that sleeps before each queued reply
///
/// Lets overlapping requests finish in a chosen order.
pub struct DelayedProvider {
    replies: Mutex<VecDeque<(Duration, String)>>,
}

impl DelayedProvider {
    /// Queue `(delay in milliseconds, reply)` pairs, one per call
    pub fn new(replies: &[(u64, &str)]) -> Self {
        Self {
            replies: Mutex::new(
                replies
                    .iter()
                    .map(|(ms, text)| (Duration::from_millis(*ms), text.to_string()))
                    .collect(),
            ),
        }
    }
}

#[async_trait]
impl Provider for DelayedProvider {
    async fn complete(&self, _messages: &[Message], _instruction: &str, _model: &str) -> Result<String> {
        let next = self
            .replies
            .lock()
            .map_err(|_| GemchatError::Provider("script lock poisoned".to_string()))?
            .pop_front();
        let (delay, text) =
            next.ok_or_else(|| GemchatError::Provider("no scripted reply left".to_string()))?;
        tokio::time::sleep(delay).await;
        Ok(text)
    }
}

/// Provider that blocks until released, for observing in-flight state
pub struct GatedProvider {
    reply: String,
    called: Notify,
    released: Notify,
}

impl GatedProvider {
    /// Create a gate that answers `reply` once released
    pub fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            called: Notify::new(),
            released: Notify::new(),
        }
    }

    /// Wait until `complete` has been entered
    pub async fn wait_until_called(&self) {
        self.called.notified().await;
    }

    /// Let the pending `complete` call return
    pub fn release(&self) {
        self.released.notify_one();
    }
}

#[async_trait]
impl Provider for GatedProvider {
    async fn complete(&self, _messages: &[Message], _instruction: &str, _model: &str) -> Result<String> {
        self.called.notify_one();
        self.released.notified().await;
        Ok(self.reply.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assert_error_contains_success() {
        let result: Result<()> = Err(GemchatError::Config("test error message".to_string()).into());
        assert_error_contains(result, "test error");
    }

    #[test]
    #[should_panic(expected = "Expected error containing")]
    fn test_assert_error_contains_ok() {
        let result: Result<()> = Ok(());
        assert_error_contains(result, "error");
    }

    #[test]
    #[should_panic(expected = "does not contain")]
    fn test_assert_error_contains_wrong_message() {
        let result: Result<()> = Err(GemchatError::Config("different error".to_string()).into());
        assert_error_contains(result, "not present");
    }

    #[tokio::test]
    async fn test_scripted_provider_runs_out() {
        let provider = ScriptedProvider::replies(&["one"]);
        assert_eq!(provider.complete(&[], "", "m").await.unwrap(), "one");
        assert!(provider.complete(&[], "", "m").await.is_err());
        assert_eq!(provider.calls(), 2);
    }

    #[test]
    fn test_memory_state_has_one_conversation() {
        let state = memory_state();
        assert_eq!(state.conversations().len(), 1);
    }
}
