//! Durable key-value persistence for gemchat state
//!
//! Conversations, the current-conversation pointer, presets and the
//! selected model each live in their own JSON-encoded slot. The
//! [`Persistence`] wrapper is total: storage failures are logged and
//! swallowed so a broken database degrades to empty state instead of
//! aborting the client.

use crate::error::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

pub mod credentials;
pub mod memory;
pub mod sled_store;

pub use credentials::CredentialStore;
pub use memory::MemoryStorage;
pub use sled_store::SledStorage;

/// Slot holding the list of conversations
pub const CONVERSATIONS_KEY: &str = "conversations";
/// Slot holding the id of the current conversation
pub const CURRENT_CONVERSATION_KEY: &str = "current_conversation_id";
/// Slot holding the list of system-instruction presets
pub const PRESETS_KEY: &str = "presets";
/// Slot holding the selected model identifier
pub const SELECTED_MODEL_KEY: &str = "selected_model";

/// Raw byte-oriented key-value backend
pub trait KeyValueStore: Send + Sync {
    /// Read the bytes stored under `key`
    fn get_raw(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Replace the bytes stored under `key`
    fn put_raw(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Remove `key`; removing a missing key is not an error
    fn remove(&self, key: &str) -> Result<()>;
}

/// Typed, infallible facade over a [`KeyValueStore`]
///
/// # Examples
///
/// ```
/// use gemchat::storage::{MemoryStorage, Persistence};
///
/// let persistence = Persistence::new(MemoryStorage::new());
/// persistence.save("selected_model", &"gemini-2.0-flash".to_string());
/// let model: Option<String> = persistence.load("selected_model");
/// assert_eq!(model.as_deref(), Some("gemini-2.0-flash"));
/// ```
#[derive(Clone)]
pub struct Persistence {
    backend: Arc<dyn KeyValueStore>,
}

impl Persistence {
    /// Wrap a backend
    pub fn new<S: KeyValueStore + 'static>(backend: S) -> Self {
        Self {
            backend: Arc::new(backend),
        }
    }

    /// Load and decode the value under `key`
    ///
    /// Returns `None` when the slot is empty, unreadable or malformed.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let bytes = match self.backend.get_raw(key) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                tracing::debug!("Storage slot '{}' is empty", key);
                return None;
            }
            Err(e) => {
                tracing::warn!("Failed to read storage slot '{}': {}", key, e);
                return None;
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("Discarding malformed storage slot '{}': {}", key, e);
                None
            }
        }
    }

    /// Encode and store `value` under `key`
    ///
    /// Failures are logged; the in-memory state stays authoritative.
    pub fn save<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        let bytes = match serde_json::to_vec(value) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!("Failed to encode storage slot '{}': {}", key, e);
                return;
            }
        };

        if let Err(e) = self.backend.put_raw(key, &bytes) {
            tracing::warn!("Failed to write storage slot '{}': {}", key, e);
        } else {
            tracing::trace!("Wrote storage slot '{}' ({} bytes)", key, bytes.len());
        }
    }

    /// Remove the value under `key`, logging failures
    pub fn clear(&self, key: &str) {
        if let Err(e) = self.backend.remove(key) {
            tracing::warn!("Failed to clear storage slot '{}': {}", key, e);
        }
    }
}
