use async_trait::async_trait;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

use gemchat::providers::{Message, Provider};
use gemchat::storage::{Persistence, SledStorage};

#[allow(dead_code)]
pub fn create_temp_persistence() -> (Persistence, TempDir) {
    let tmp = TempDir::new().expect("failed to create tempdir");
    let storage = SledStorage::open_in(tmp.path()).expect("failed to open sled storage");
    (Persistence::new(storage), tmp)
}

#[allow(dead_code)]
pub fn reopen_persistence(dir: &TempDir) -> Persistence {
    let storage = SledStorage::open_in(dir.path()).expect("failed to reopen sled storage");
    Persistence::new(storage)
}

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}

/// Mock provider that returns predetermined replies (in order) and records
/// what it was asked.
#[allow(dead_code)]
#[derive(Clone, Default)]
pub struct MockProvider {
    replies: Vec<String>,
    calls: Arc<Mutex<Vec<(Vec<Message>, String, String)>>>,
}

#[allow(dead_code)]
impl MockProvider {
    pub fn new(replies: &[&str]) -> Self {
        Self {
            replies: replies.iter().map(|r| r.to_string()).collect(),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn calls(&self) -> Vec<(Vec<Message>, String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn complete(
        &self,
        messages: &[Message],
        instruction: &str,
        model: &str,
    ) -> gemchat::error::Result<String> {
        let mut calls = self.calls.lock().unwrap();
        let i = calls.len();
        calls.push((messages.to_vec(), instruction.to_string(), model.to_string()));
        Ok(self
            .replies
            .get(i)
            .cloned()
            .unwrap_or_else(|| "(no more replies)".to_string()))
    }
}
