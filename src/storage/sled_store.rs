//! `sled`-backed key-value storage
//!
//! One embedded database per data directory; every write is flushed so
//! state survives an abrupt exit right after a mutation.

use super::KeyValueStore;
use crate::error::{GemchatError, Result};
use anyhow::Context;
use directories::ProjectDirs;
use sled::Db;
use std::path::{Path, PathBuf};

/// Name of the database directory inside the data directory
const DB_DIR_NAME: &str = "state.sled";

/// Persistent key-value store
pub struct SledStorage {
    db: Db,
    path: PathBuf,
}

impl SledStorage {
    /// Open the store in the platform data directory
    ///
    /// # Errors
    ///
    /// Returns `GemchatError::Storage` if the data directory cannot be
    /// determined or the database cannot be opened
    pub fn open_default() -> Result<Self> {
        Self::open_in(default_data_dir()?)
    }

    /// Open the store inside `data_dir`, creating it if needed
    ///
    /// # Examples
    ///
    /// ```
    /// use gemchat::storage::{KeyValueStore, SledStorage};
    ///
    /// let dir = tempfile::tempdir().unwrap();
    /// let storage = SledStorage::open_in(dir.path()).unwrap();
    /// storage.put_raw("k", b"v").unwrap();
    /// assert_eq!(storage.get_raw("k").unwrap(), Some(b"v".to_vec()));
    /// ```
    pub fn open_in(data_dir: impl AsRef<Path>) -> Result<Self> {
        let data_dir = data_dir.as_ref();
        std::fs::create_dir_all(data_dir)
            .context("Failed to create data directory")
            .map_err(|e| GemchatError::Storage(e.to_string()))?;

        let path = data_dir.join(DB_DIR_NAME);
        let db = sled::open(&path)
            .map_err(|e| GemchatError::Storage(format!("Failed to open database: {}", e)))?;

        tracing::debug!("Opened state database at {}", path.display());
        Ok(Self { db, path })
    }

    /// Open either the configured directory or the platform default
    pub fn open(data_dir: Option<&Path>) -> Result<Self> {
        match data_dir {
            Some(dir) => Self::open_in(dir),
            None => Self::open_default(),
        }
    }

    /// Location of the database on disk
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Platform data directory for gemchat
///
/// # Errors
///
/// Returns `GemchatError::Storage` when no home directory can be found
pub fn default_data_dir() -> Result<PathBuf> {
    let proj_dirs = ProjectDirs::from("dev", "gemchat", "gemchat")
        .ok_or_else(|| GemchatError::Storage("Could not determine data directory".into()))?;
    Ok(proj_dirs.data_dir().to_path_buf())
}

impl KeyValueStore for SledStorage {
    fn get_raw(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let value = self
            .db
            .get(key.as_bytes())
            .map_err(|e| GemchatError::Storage(format!("Get failed: {}", e)))?;
        Ok(value.map(|v| v.to_vec()))
    }

    fn put_raw(&self, key: &str, value: &[u8]) -> Result<()> {
        self.db
            .insert(key.as_bytes(), value)
            .map_err(|e| GemchatError::Storage(format!("Insert failed: {}", e)))?;

        self.db
            .flush()
            .map_err(|e| GemchatError::Storage(format!("Flush failed: {}", e)))?;

        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.db
            .remove(key.as_bytes())
            .map_err(|e| GemchatError::Storage(format!("Remove failed: {}", e)))?;

        self.db
            .flush()
            .map_err(|e| GemchatError::Storage(format!("Flush failed: {}", e)))?;

        Ok(())
    }
}
