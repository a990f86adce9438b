//! gemchat - multi-conversation chat client library
//!
//! This library provides the core functionality for gemchat: named
//! conversations with per-conversation system instructions, reusable
//! instruction presets, durable key-value persistence, and a chat
//! orchestrator that talks to the Gemini API.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `state`: Conversation and preset stores plus the persisted `AppState`
//! - `storage`: Key-value persistence (`sled`) and keyring credentials
//! - `chat`: Send, resend and edit flows with optimistic commits
//! - `providers`: Completion provider abstraction and the Gemini client
//! - `export`: Markdown transcript rendering
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli` / `commands`: Command-line interface and handlers
//!
//! # Example
//!
//! ```no_run
//! use gemchat::{AppState, ChatOrchestrator, Config};
//! use gemchat::providers::create_provider;
//! use gemchat::storage::{Persistence, SledStorage};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.yaml", &Default::default())?;
//!     config.validate()?;
//!
//!     let storage = SledStorage::open(config.storage.data_dir.as_deref())?;
//!     let state = AppState::load(Persistence::new(storage), &config.provider.default_model);
//!     let id = state.current_id().expect("state always has a conversation");
//!
//!     let provider = create_provider(&config.provider, None)?;
//!     let chat = ChatOrchestrator::new(state.into_shared(), Arc::from(provider));
//!     println!("{}", chat.send(&id, "Hello!", None).await?);
//!     Ok(())
//! }
//! ```

pub mod chat;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod export;
pub mod providers;
pub mod state;
pub mod storage;

// Re-export commonly used types
pub use chat::ChatOrchestrator;
pub use config::Config;
pub use error::{GemchatError, Result};
pub use state::{AppState, Conversation, SystemInstructionPreset};

#[cfg(test)]
pub mod test_utils;
