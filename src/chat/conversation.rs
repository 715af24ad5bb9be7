//! Conversation state and its transitions.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::ask::{AskRequest, TRANSPORT_FAILURE_TEXT};

/// Transient text shown while an answer is outstanding.
pub const PLACEHOLDER_TEXT: &str = "Thinking...";

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    System,
    User,
    Assistant,
}

/// A single chat entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub from: Origin,
    pub text: String,
}

impl ChatMessage {
    fn new(from: Origin, text: impl Into<String>) -> Self {
        Self {
            from,
            text: text.into(),
        }
    }
}

/// Why a send was refused.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendError {
    /// An earlier question is still waiting for its answer.
    #[error("a question is already in flight")]
    Busy,
    /// The conversation was removed.
    #[error("conversation is closed")]
    Closed,
}

/// Greeting every conversation starts with.
#[must_use]
pub fn greeting(context_id: &str) -> String {
    format!(r#"Ask me anything about {context_id}. Example: "What did we agree on payment terms?""#)
}

/// An ordered, append-only message list scoped to one context identifier.
///
/// The only in-place mutation is replacing the placeholder of the pending
/// turn. Clones share the same underlying state.
#[derive(Debug, Clone)]
pub struct Conversation {
    inner: Arc<ConversationInner>,
}

#[derive(Debug)]
struct ConversationInner {
    id: String,
    context_id: String,
    state: RwLock<ConversationState>,
    last_activity: RwLock<DateTime<Utc>>,
    cancel: CancellationToken,
}

#[derive(Debug, Default)]
struct ConversationState {
    messages: Vec<ChatMessage>,
    pending: Option<PendingSlot>,
    next_turn: u64,
}

#[derive(Debug, Clone, Copy)]
struct PendingSlot {
    turn: u64,
    index: usize,
}

/// A question that has been appended but not yet answered.
///
/// Dropping a turn without settling it (for example when the future driving
/// it is dropped) replaces the placeholder with the transport failure text,
/// so the conversation never stays pending.
#[derive(Debug)]
pub struct PendingTurn {
    conversation: Conversation,
    turn: u64,
    request: AskRequest,
    settled: bool,
}

impl PendingTurn {
    /// Request to send to the backend.
    #[must_use]
    pub fn request(&self) -> &AskRequest {
        &self.request
    }

    /// Conversation this turn belongs to.
    #[must_use]
    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Resolves once the owning conversation is cancelled.
    pub async fn cancelled(&self) {
        self.conversation.inner.cancel.cancelled().await;
    }

    /// Replace the placeholder with `text`.
    ///
    /// Returns `false` (and changes nothing) if the conversation was
    /// cancelled in the meantime.
    pub fn settle(mut self, text: impl Into<String>) -> bool {
        self.settled = true;
        self.conversation.settle(self.turn, text.into())
    }
}

impl Drop for PendingTurn {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        if self.conversation.settle(self.turn, TRANSPORT_FAILURE_TEXT.to_string()) {
            tracing::warn!(
                name: "chat.turn.abandoned",
                conversation = %self.conversation.id(),
                "Turn dropped before its answer arrived"
            );
        }
    }
}

impl Conversation {
    /// Create a conversation seeded with the system greeting.
    #[must_use]
    pub fn new(id: impl Into<String>, context_id: impl Into<String>) -> Self {
        let context_id = context_id.into();
        let now = Utc::now();
        let state = ConversationState {
            messages: vec![ChatMessage::new(Origin::System, greeting(&context_id))],
            ..ConversationState::default()
        };

        Self {
            inner: Arc::new(ConversationInner {
                id: id.into(),
                context_id,
                state: RwLock::new(state),
                last_activity: RwLock::new(now),
                cancel: CancellationToken::new(),
            }),
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.inner.id
    }

    /// Context identifier every question in this conversation is scoped to.
    #[must_use]
    pub fn context_id(&self) -> &str {
        &self.inner.context_id
    }

    /// Snapshot of all messages, oldest first.
    #[must_use]
    pub fn messages(&self) -> Vec<ChatMessage> {
        self.read().messages.clone()
    }

    #[must_use]
    pub fn message_count(&self) -> usize {
        self.read().messages.len()
    }

    /// Whether a question is waiting for its answer.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.read().pending.is_some()
    }

    /// Append the user message and the placeholder.
    ///
    /// Blank input is ignored and yields `Ok(None)`. Otherwise the question
    /// is stored and sent exactly as typed.
    pub fn begin_send(&self, input: &str) -> Result<Option<PendingTurn>, SendError> {
        if input.trim().is_empty() {
            return Ok(None);
        }
        let question = input;

        let mut state = self.write();
        if self.is_cancelled() {
            return Err(SendError::Closed);
        }
        if state.pending.is_some() {
            return Err(SendError::Busy);
        }

        state.messages.push(ChatMessage::new(Origin::User, question));
        state
            .messages
            .push(ChatMessage::new(Origin::Assistant, PLACEHOLDER_TEXT));

        let turn = state.next_turn;
        let index = state.messages.len() - 1;
        state.next_turn += 1;
        state.pending = Some(PendingSlot { turn, index });
        drop(state);
        self.touch();

        Ok(Some(PendingTurn {
            conversation: self.clone(),
            turn,
            request: AskRequest {
                question: question.to_string(),
                company_id: self.inner.context_id.clone(),
            },
            settled: false,
        }))
    }

    fn settle(&self, turn: u64, text: String) -> bool {
        let mut state = self.write();
        if self.is_cancelled() {
            return false;
        }
        match state.pending {
            Some(slot) if slot.turn == turn => {
                state.messages[slot.index] = ChatMessage::new(Origin::Assistant, text);
                state.pending = None;
                drop(state);
                self.touch();
                true
            }
            _ => false,
        }
    }

    /// Stop accepting sends and drop any outstanding answer.
    ///
    /// Cancellation is taken under the state lock, so a settle either
    /// completes before it or observes it.
    pub fn cancel(&self) {
        let _state = self.write();
        self.inner.cancel.cancel();
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancel.is_cancelled()
    }

    /// Check if the conversation has been idle longer than `timeout`.
    #[must_use]
    pub fn is_expired_with_timeout(&self, timeout: Duration) -> bool {
        let last = *self
            .inner
            .last_activity
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        // Negative duration means clock skew; treat as fresh.
        (Utc::now() - last)
            .to_std()
            .is_ok_and(|idle| idle > timeout)
    }

    fn touch(&self) {
        let mut guard = self
            .inner
            .last_activity
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *guard = Utc::now();
    }

    fn read(&self) -> RwLockReadGuard<'_, ConversationState> {
        self.inner.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, ConversationState> {
        self.inner.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}
