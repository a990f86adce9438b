//! Conversation, preset and model state
//!
//! The pure stores ([`ConversationStore`], [`PresetStore`]) hold data and
//! enforce invariants; [`AppState`] composes them with persistence.

pub mod app;
pub mod conversation;
pub mod preset;

pub use app::{AppState, SharedState};
pub use conversation::{Conversation, ConversationStore};
pub use preset::{PresetStore, SystemInstructionPreset};
