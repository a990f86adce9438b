//! Conversation store
//!
//! Owns every conversation plus the pointer to the current one. All
//! mutations address conversations by id and replace them in place, so
//! edits to different conversations never interfere with each other.

use crate::error::{GemchatError, Result};
use crate::providers::{Message, Role};
use serde::{Deserialize, Serialize};

/// A named transcript with its own system instruction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    /// Unique identifier (UUID v4)
    pub id: String,
    /// Display name
    pub name: String,
    /// Messages, oldest first
    #[serde(default)]
    pub messages: Vec<Message>,
    /// Steering text sent with every request in this conversation
    #[serde(default)]
    pub system_instruction: String,
}

impl Conversation {
    /// Create an empty conversation with a fresh id
    ///
    /// # Examples
    ///
    /// ```
    /// use gemchat::state::Conversation;
    ///
    /// let conversation = Conversation::new("Scratch");
    /// assert_eq!(conversation.name, "Scratch");
    /// assert!(conversation.messages.is_empty());
    /// assert!(conversation.system_instruction.is_empty());
    /// ```
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            messages: Vec::new(),
            system_instruction: String::new(),
        }
    }

    /// Short form of the id for listings
    pub fn short_id(&self) -> &str {
        self.id.get(..8).unwrap_or(&self.id)
    }

    /// Most recent message, if any
    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    fn message_at(&self, index: usize) -> Result<&Message> {
        self.messages.get(index).ok_or_else(|| {
            GemchatError::InvalidMessageIndex {
                index,
                len: self.messages.len(),
            }
            .into()
        })
    }
}

/// The set of conversations and the current-conversation pointer
///
/// Invariants:
/// - ids are unique;
/// - when the store is non-empty and the pointer is set, it names a member.
#[derive(Debug, Clone, Default)]
pub struct ConversationStore {
    conversations: Vec<Conversation>,
    current_id: Option<String>,
}

impl ConversationStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a store from persisted parts
    ///
    /// Duplicate ids are dropped (first occurrence wins) and an unknown
    /// current id is discarded; call [`ensure_current`](Self::ensure_current)
    /// afterwards to repair the pointer.
    pub fn from_parts(conversations: Vec<Conversation>, current_id: Option<String>) -> Self {
        let mut unique: Vec<Conversation> = Vec::with_capacity(conversations.len());
        for conversation in conversations {
            if unique.iter().any(|c| c.id == conversation.id) {
                tracing::warn!("Dropping conversation with duplicate id {}", conversation.id);
                continue;
            }
            unique.push(conversation);
        }

        let current_id = current_id.filter(|id| unique.iter().any(|c| &c.id == id));

        Self {
            conversations: unique,
            current_id,
        }
    }

    /// Create a new empty conversation and make it current
    ///
    /// The default name is `"Conversation N"` with N one more than the
    /// number of conversations before creation.
    ///
    /// # Examples
    ///
    /// ```
    /// use gemchat::state::ConversationStore;
    ///
    /// let mut store = ConversationStore::new();
    /// let id = store.create();
    /// assert_eq!(store.current_id(), Some(id.as_str()));
    /// assert_eq!(store.get(&id).unwrap().name, "Conversation 1");
    /// ```
    pub fn create(&mut self) -> String {
        let name = format!("Conversation {}", self.conversations.len() + 1);
        let mut conversation = Conversation::new(name);
        while self.contains(&conversation.id) {
            conversation.id = uuid::Uuid::new_v4().to_string();
        }

        let id = conversation.id.clone();
        tracing::debug!("Created conversation {} ({})", conversation.name, id);
        self.conversations.push(conversation);
        self.current_id = Some(id.clone());
        id
    }

    /// Make `id` the current conversation
    ///
    /// Returns false (and changes nothing) if the id is unknown.
    pub fn switch_to(&mut self, id: &str) -> bool {
        if !self.contains(id) {
            tracing::debug!("Ignoring switch to unknown conversation {}", id);
            return false;
        }
        self.current_id = Some(id.to_string());
        true
    }

    /// Replace the name of a conversation
    pub fn rename(&mut self, id: &str, name: impl Into<String>) -> Result<()> {
        self.get_mut(id)?.name = name.into();
        Ok(())
    }

    /// Remove a conversation
    ///
    /// If it was current, the first remaining conversation becomes current,
    /// or a fresh one is created when none remain. Unknown ids are ignored.
    pub fn delete(&mut self, id: &str) -> Option<Conversation> {
        let position = self.conversations.iter().position(|c| c.id == id)?;
        let removed = self.conversations.remove(position);

        if self.current_id.as_deref() == Some(id) {
            match self.conversations.first() {
                Some(first) => self.current_id = Some(first.id.clone()),
                None => {
                    self.current_id = None;
                    self.create();
                }
            }
        }

        tracing::debug!("Deleted conversation {} ({})", removed.name, removed.id);
        Some(removed)
    }

    /// Empty a conversation's message list in place
    pub fn clear(&mut self, id: &str) -> Result<()> {
        self.get_mut(id)?.messages.clear();
        Ok(())
    }

    /// Append a user-authored message
    pub fn append_user_message(&mut self, id: &str, text: impl Into<String>) -> Result<()> {
        self.get_mut(id)?.messages.push(Message::user(text));
        Ok(())
    }

    /// Append a model-authored message
    pub fn append_model_message(&mut self, id: &str, text: impl Into<String>) -> Result<()> {
        self.get_mut(id)?.messages.push(Message::model(text));
        Ok(())
    }

    /// Truncate the history at `index` and append `new_tail`
    ///
    /// An index past the end keeps the whole history.
    pub fn replace_messages_from(
        &mut self,
        id: &str,
        index: usize,
        new_tail: Vec<Message>,
    ) -> Result<()> {
        let conversation = self.get_mut(id)?;
        let cut = index.min(conversation.messages.len());
        conversation.messages.truncate(cut);
        conversation.messages.extend(new_tail);
        Ok(())
    }

    /// Overwrite the text of a model-authored message without truncating
    ///
    /// # Errors
    ///
    /// Returns `InvalidMessageIndex` for an out-of-range index and
    /// `InvalidEdit` if the message was written by the user.
    pub fn edit_model_message(
        &mut self,
        id: &str,
        index: usize,
        text: impl Into<String>,
    ) -> Result<()> {
        let conversation = self.get_mut(id)?;
        if conversation.message_at(index)?.role != Role::Model {
            return Err(GemchatError::InvalidEdit(format!(
                "message {} is not a model message",
                index
            ))
            .into());
        }
        conversation.messages[index].text = text.into();
        Ok(())
    }

    /// Replace the system instruction of a conversation
    pub fn set_instruction(&mut self, id: &str, instruction: impl Into<String>) -> Result<()> {
        self.get_mut(id)?.system_instruction = instruction.into();
        Ok(())
    }

    /// Repair the current pointer
    ///
    /// An empty store gets one new conversation; a missing or dangling
    /// pointer moves to the first conversation. Returns true if anything
    /// changed.
    pub fn ensure_current(&mut self) -> bool {
        if self.conversations.is_empty() {
            self.create();
            return true;
        }

        if self.current().is_none() {
            self.current_id = self.conversations.first().map(|c| c.id.clone());
            return true;
        }

        false
    }

    /// Look up a conversation by id
    pub fn get(&self, id: &str) -> Option<&Conversation> {
        self.conversations.iter().find(|c| c.id == id)
    }

    fn get_mut(&mut self, id: &str) -> Result<&mut Conversation> {
        self.conversations
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| GemchatError::ConversationNotFound(id.to_string()).into())
    }

    /// Returns true if a conversation with `id` exists
    pub fn contains(&self, id: &str) -> bool {
        self.conversations.iter().any(|c| c.id == id)
    }

    /// The current conversation, if the pointer resolves
    pub fn current(&self) -> Option<&Conversation> {
        self.current_id.as_deref().and_then(|id| self.get(id))
    }

    /// Id of the current conversation
    pub fn current_id(&self) -> Option<&str> {
        self.current_id.as_deref()
    }

    /// All conversations in creation order
    pub fn list(&self) -> &[Conversation] {
        &self.conversations
    }

    /// Number of conversations
    pub fn len(&self) -> usize {
        self.conversations.len()
    }

    /// Returns true if there are no conversations
    pub fn is_empty(&self) -> bool {
        self.conversations.is_empty()
    }

    /// Resolve a user-typed selector
    ///
    /// Accepts a 1-based list position, a full id, or an unambiguous id
    /// prefix, in that order.
    pub fn resolve(&self, selector: &str) -> Option<&Conversation> {
        let selector = selector.trim().trim_start_matches('#');
        if selector.is_empty() {
            return None;
        }

        if let Ok(position) = selector.parse::<usize>() {
            if position >= 1 && position <= self.conversations.len() {
                return self.conversations.get(position - 1);
            }
        }

        self.find_by_prefix(selector)
    }

    /// Find a conversation by full id or unambiguous id prefix
    pub fn find_by_prefix(&self, prefix: &str) -> Option<&Conversation> {
        if prefix.is_empty() {
            return None;
        }

        if let Some(exact) = self.get(prefix) {
            return Some(exact);
        }

        let mut matches = self.conversations.iter().filter(|c| c.id.starts_with(prefix));
        match (matches.next(), matches.next()) {
            (Some(only), None) => Some(only),
            _ => None,
        }
    }
}
