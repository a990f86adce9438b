//! Send, resend and edit flows against the shared application state

use crate::error::{GemchatError, Result};
use crate::providers::{complete_or_placeholder, Message, Provider, Role};
use crate::state::{AppState, SharedState};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLockReadGuard, RwLockWriteGuard};

/// Drives requests to the provider and commits results into [`AppState`]
///
/// The state lock is never held across the provider call, so other
/// mutations (switching, deleting, renaming) stay possible while a request
/// is in flight.
#[derive(Clone)]
pub struct ChatOrchestrator {
    state: SharedState,
    provider: Arc<dyn Provider>,
    in_flight: Arc<AtomicUsize>,
}

/// Marks a request as in flight until dropped
struct BusyGuard {
    counter: Arc<AtomicUsize>,
}

impl BusyGuard {
    fn engage(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self {
            counter: Arc::clone(counter),
        }
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::SeqCst);
    }
}

impl ChatOrchestrator {
    /// Create an orchestrator over shared state and a provider
    pub fn new(state: SharedState, provider: Arc<dyn Provider>) -> Self {
        Self {
            state,
            provider,
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// The shared state this orchestrator commits into
    pub fn state(&self) -> &SharedState {
        &self.state
    }

    /// Returns true while at least one request is awaiting the provider
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    /// Lock the state for reading
    pub fn read_state(&self) -> Result<RwLockReadGuard<'_, AppState>> {
        self.state
            .read()
            .map_err(|_| GemchatError::State("Failed to acquire read lock on state".to_string()).into())
    }

    /// Lock the state for writing
    pub fn write_state(&self) -> Result<RwLockWriteGuard<'_, AppState>> {
        self.state
            .write()
            .map_err(|_| GemchatError::State("Failed to acquire write lock on state".to_string()).into())
    }

    /// Send `text` as a user message and commit the model's reply
    ///
    /// The conversation history becomes `base_history` (or the existing
    /// history when `None`) followed by the new user message. That list is
    /// persisted before the provider is called. When the reply arrives the
    /// conversation's history is replaced by that list plus the reply, so of
    /// two overlapping sends to one conversation the later commit wins.
    /// Provider failures never surface as errors: they are committed as
    /// placeholder text.
    ///
    /// Returns the committed reply text.
    ///
    /// # Errors
    ///
    /// Returns `ConversationNotFound` if `conversation_id` is unknown when
    /// the request starts.
    pub async fn send(
        &self,
        conversation_id: &str,
        text: &str,
        base_history: Option<Vec<Message>>,
    ) -> Result<String> {
        let (messages, instruction, model) = {
            let mut state = self.write_state()?;
            let conversation = state
                .conversation(conversation_id)
                .ok_or_else(|| GemchatError::ConversationNotFound(conversation_id.to_string()))?;

            let mut messages = base_history.unwrap_or_else(|| conversation.messages.clone());
            messages.push(Message::user(text));
            let instruction = conversation.system_instruction.clone();
            let model = state.selected_model().to_string();

            state.replace_messages_from(conversation_id, 0, messages.clone())?;
            (messages, instruction, model)
        };

        tracing::debug!(
            "Sending {} messages to {} for conversation {}",
            messages.len(),
            model,
            conversation_id
        );

        let reply = {
            let _busy = BusyGuard::engage(&self.in_flight);
            complete_or_placeholder(self.provider.as_ref(), &messages, &instruction, &model).await
        };

        let mut committed = messages;
        committed.push(Message::model(reply.clone()));

        let mut state = self.write_state()?;
        if state.conversation(conversation_id).is_some() {
            state.replace_messages_from(conversation_id, 0, committed)?;
        } else {
            tracing::warn!(
                "Conversation {} was deleted before its reply arrived; dropping reply",
                conversation_id
            );
        }

        Ok(reply)
    }

    /// Re-run the request for the user message at `index`
    ///
    /// Everything from `index` on is replaced by the same user text and a
    /// fresh reply.
    ///
    /// # Errors
    ///
    /// Returns `InvalidMessageIndex` for an out-of-range index and
    /// `InvalidEdit` if the message is model-authored.
    pub async fn resend(&self, conversation_id: &str, index: usize) -> Result<String> {
        let (text, history) = {
            let state = self.read_state()?;
            let message = Self::message_at(&state, conversation_id, index)?;
            if message.role != Role::User {
                return Err(GemchatError::InvalidEdit(format!(
                    "message {} is not a user message",
                    index
                ))
                .into());
            }
            let history = Self::history_before(&state, conversation_id, index)?;
            (message.text.clone(), history)
        };

        tracing::info!("Resending message {} in conversation {}", index, conversation_id);
        self.send(conversation_id, &text, Some(history)).await
    }

    /// Edit the message at `index`
    ///
    /// A user message is replaced by `new_text` and everything after it is
    /// regenerated; the new reply is returned. A model message is rewritten
    /// in place without a request, and `None` is returned.
    pub async fn edit(
        &self,
        conversation_id: &str,
        index: usize,
        new_text: &str,
    ) -> Result<Option<String>> {
        let history = {
            let mut state = self.write_state()?;
            let role = Self::message_at(&state, conversation_id, index)?.role;
            if role == Role::Model {
                state.edit_model_message(conversation_id, index, new_text)?;
                tracing::debug!("Edited model message {} in {}", index, conversation_id);
                return Ok(None);
            }
            Self::history_before(&state, conversation_id, index)?
        };

        let reply = self.send(conversation_id, new_text, Some(history)).await?;
        Ok(Some(reply))
    }

    fn message_at<'a>(state: &'a AppState, id: &str, index: usize) -> Result<&'a Message> {
        let conversation = state
            .conversation(id)
            .ok_or_else(|| GemchatError::ConversationNotFound(id.to_string()))?;
        conversation.messages.get(index).ok_or_else(|| {
            GemchatError::InvalidMessageIndex {
                index,
                len: conversation.messages.len(),
            }
            .into()
        })
    }

    fn history_before(state: &AppState, id: &str, index: usize) -> Result<Vec<Message>> {
        let conversation = state
            .conversation(id)
            .ok_or_else(|| GemchatError::ConversationNotFound(id.to_string()))?;
        Ok(conversation.messages[..index.min(conversation.messages.len())].to_vec())
    }
}
