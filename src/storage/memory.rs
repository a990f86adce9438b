//! In-process key-value backend
//!
//! Clones share the same map, so a test can hand one clone to the
//! application state and inspect or reload from another.

use super::KeyValueStore;
use crate::error::{GemchatError, Result};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Volatile storage backed by a shared `HashMap`
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl MemoryStorage {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of occupied slots
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    /// Returns true if no slot is occupied
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStorage {
    fn get_raw(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let entries = self
            .entries
            .read()
            .map_err(|_| GemchatError::Storage("Failed to acquire read lock".to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn put_raw(&self, key: &str, value: &[u8]) -> Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| GemchatError::Storage("Failed to acquire write lock".to_string()))?;
        entries.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| GemchatError::Storage("Failed to acquire write lock".to_string()))?;
        entries.remove(key);
        Ok(())
    }
}
