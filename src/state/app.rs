//! Application state
//!
//! [`AppState`] is the single owner of conversations, presets and the
//! selected model. Every mutation goes through one of its methods and is
//! followed by a write of the affected storage slot(s); there is no
//! batching and no cross-slot transaction.

use super::conversation::{Conversation, ConversationStore};
use super::preset::{PresetStore, SystemInstructionPreset};
use crate::error::{GemchatError, Result};
use crate::providers::Message;
use crate::storage::{
    Persistence, CONVERSATIONS_KEY, CURRENT_CONVERSATION_KEY, PRESETS_KEY, SELECTED_MODEL_KEY,
};
use std::sync::{Arc, RwLock};

/// State shared between the chat loop and in-flight requests
pub type SharedState = Arc<RwLock<AppState>>;

/// Explicit application state with persist-after-mutation semantics
pub struct AppState {
    conversations: ConversationStore,
    presets: PresetStore,
    selected_model: String,
    persistence: Persistence,
}

impl AppState {
    /// Load all slots and repair the current-conversation pointer
    ///
    /// Unreadable slots fall back to empty state. If no conversation
    /// survives loading, one is created and persisted immediately.
    ///
    /// # Examples
    ///
    /// ```
    /// use gemchat::state::AppState;
    /// use gemchat::storage::{MemoryStorage, Persistence};
    ///
    /// let state = AppState::load(Persistence::new(MemoryStorage::new()), "gemini-2.0-flash");
    /// let current = state.current_conversation().unwrap();
    /// assert_eq!(current.name, "Conversation 1");
    /// assert_eq!(state.selected_model(), "gemini-2.0-flash");
    /// ```
    pub fn load(persistence: Persistence, default_model: &str) -> Self {
        let conversations: Vec<Conversation> =
            persistence.load(CONVERSATIONS_KEY).unwrap_or_default();
        let current_id: Option<String> = persistence.load(CURRENT_CONVERSATION_KEY);
        let presets: Vec<SystemInstructionPreset> =
            persistence.load(PRESETS_KEY).unwrap_or_default();
        let selected_model = persistence
            .load::<String>(SELECTED_MODEL_KEY)
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| default_model.to_string());

        let mut state = Self {
            conversations: ConversationStore::from_parts(conversations, current_id),
            presets: PresetStore::from_presets(presets),
            selected_model,
            persistence,
        };

        if state.conversations.ensure_current() {
            tracing::debug!("Repaired current conversation after load");
            state.persist_conversations();
        }

        tracing::info!(
            "Loaded {} conversations, {} presets, model={}",
            state.conversations.len(),
            state.presets.len(),
            state.selected_model
        );

        state
    }

    /// Wrap this state for sharing with the orchestrator
    pub fn into_shared(self) -> SharedState {
        Arc::new(RwLock::new(self))
    }

    /// Conversation store (read-only)
    pub fn conversations(&self) -> &ConversationStore {
        &self.conversations
    }

    /// Preset store (read-only)
    pub fn presets(&self) -> &PresetStore {
        &self.presets
    }

    /// Selected model identifier
    pub fn selected_model(&self) -> &str {
        &self.selected_model
    }

    /// The current conversation
    pub fn current_conversation(&self) -> Option<&Conversation> {
        self.conversations.current()
    }

    /// Id of the current conversation
    pub fn current_id(&self) -> Option<String> {
        self.conversations.current_id().map(str::to_string)
    }

    /// Look up a conversation by id
    pub fn conversation(&self, id: &str) -> Option<&Conversation> {
        self.conversations.get(id)
    }

    fn require_current_id(&self) -> Result<String> {
        self.current_id()
            .ok_or_else(|| GemchatError::ConversationNotFound("<current>".to_string()).into())
    }

    fn persist_conversations(&self) {
        self.persistence
            .save(CONVERSATIONS_KEY, self.conversations.list());
        match self.conversations.current_id() {
            Some(id) => self.persistence.save(CURRENT_CONVERSATION_KEY, id),
            None => self.persistence.clear(CURRENT_CONVERSATION_KEY),
        }
    }

    fn persist_presets(&self) {
        self.persistence.save(PRESETS_KEY, self.presets.list());
    }

    fn persist_model(&self) {
        self.persistence
            .save(SELECTED_MODEL_KEY, self.selected_model.as_str());
    }

    /// Create a conversation and make it current
    pub fn create_conversation(&mut self) -> String {
        let id = self.conversations.create();
        self.persist_conversations();
        id
    }

    /// Switch the current conversation; unknown ids are ignored
    pub fn switch_conversation(&mut self, id: &str) -> bool {
        let switched = self.conversations.switch_to(id);
        if switched {
            self.persist_conversations();
        }
        switched
    }

    /// Rename a conversation
    ///
    /// # Errors
    ///
    /// Returns `InvalidEdit` for a blank name and `ConversationNotFound`
    /// for an unknown id
    pub fn rename_conversation(&mut self, id: &str, name: &str) -> Result<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(GemchatError::InvalidEdit("name cannot be empty".to_string()).into());
        }
        self.conversations.rename(id, name)?;
        self.persist_conversations();
        Ok(())
    }

    /// Delete a conversation, keeping the current pointer valid
    pub fn delete_conversation(&mut self, id: &str) -> Option<Conversation> {
        let removed = self.conversations.delete(id);
        if removed.is_some() {
            self.persist_conversations();
        }
        removed
    }

    /// Remove every message of a conversation
    pub fn clear_conversation(&mut self, id: &str) -> Result<()> {
        self.conversations.clear(id)?;
        self.persist_conversations();
        Ok(())
    }

    /// Set a conversation's system instruction
    pub fn set_instruction(&mut self, id: &str, instruction: &str) -> Result<()> {
        self.conversations.set_instruction(id, instruction)?;
        self.persist_conversations();
        Ok(())
    }

    /// Append a user message
    pub fn append_user_message(&mut self, id: &str, text: &str) -> Result<()> {
        self.conversations.append_user_message(id, text)?;
        self.persist_conversations();
        Ok(())
    }

    /// Append a model message
    pub fn append_model_message(&mut self, id: &str, text: &str) -> Result<()> {
        self.conversations.append_model_message(id, text)?;
        self.persist_conversations();
        Ok(())
    }

    /// Truncate at `index` and append `new_tail`
    pub fn replace_messages_from(
        &mut self,
        id: &str,
        index: usize,
        new_tail: Vec<Message>,
    ) -> Result<()> {
        self.conversations.replace_messages_from(id, index, new_tail)?;
        self.persist_conversations();
        Ok(())
    }

    /// Overwrite a model message's text in place
    pub fn edit_model_message(&mut self, id: &str, index: usize, text: &str) -> Result<()> {
        self.conversations.edit_model_message(id, index, text)?;
        self.persist_conversations();
        Ok(())
    }

    /// Save (upsert) a preset
    ///
    /// Returns true if an existing preset was overwritten.
    pub fn save_preset(&mut self, name: &str, instruction: &str) -> Result<bool> {
        let name = name.trim();
        if name.is_empty() {
            return Err(
                GemchatError::InvalidEdit("preset name cannot be empty".to_string()).into(),
            );
        }
        let overwritten = self.presets.save(name, instruction);
        self.persist_presets();
        Ok(overwritten)
    }

    /// Save the current conversation's instruction as a preset
    pub fn save_current_instruction_as(&mut self, name: &str) -> Result<bool> {
        let instruction = self
            .current_conversation()
            .map(|c| c.system_instruction.clone())
            .unwrap_or_default();
        self.save_preset(name, &instruction)
    }

    /// Delete a preset
    ///
    /// When the current conversation's instruction is textually identical to
    /// the deleted preset's instruction, that instruction is cleared too.
    /// The comparison is by text, so a hand-typed instruction that happens
    /// to match is cleared as well.
    pub fn delete_preset(&mut self, name: &str) -> Result<SystemInstructionPreset> {
        let removed = self
            .presets
            .delete(name)
            .ok_or_else(|| GemchatError::PresetNotFound(name.to_string()))?;
        self.persist_presets();

        if let Some(current) = self.conversations.current() {
            if current.system_instruction == removed.instruction {
                let id = current.id.clone();
                tracing::debug!(
                    "Clearing instruction of {} after deleting preset '{}'",
                    id,
                    removed.name
                );
                self.conversations.set_instruction(&id, "")?;
                self.persist_conversations();
            }
        }

        Ok(removed)
    }

    /// Copy a preset's instruction into the current conversation
    pub fn apply_preset(&mut self, name: &str) -> Result<()> {
        let instruction = self
            .presets
            .get(name)
            .map(|p| p.instruction.clone())
            .ok_or_else(|| GemchatError::PresetNotFound(name.to_string()))?;
        let id = self.require_current_id()?;
        self.set_instruction(&id, &instruction)
    }

    /// Select the model used for subsequent requests
    pub fn select_model(&mut self, model: &str) -> Result<()> {
        let model = model.trim();
        if model.is_empty() {
            return Err(GemchatError::InvalidEdit("model cannot be empty".to_string()).into());
        }
        self.selected_model = model.to_string();
        self.persist_model();
        Ok(())
    }
}
