//! Thread-safe registry of live conversations.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use uuid::Uuid;

use super::conversation::Conversation;

/// Store for conversations keyed by id.
///
/// Removing a conversation cancels it, so answers that arrive afterwards are
/// dropped instead of being applied.
#[derive(Debug, Clone, Default)]
pub struct ConversationStore {
    inner: Arc<RwLock<HashMap<String, Conversation>>>,
}

impl ConversationStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new conversation scoped to `context_id`.
    #[must_use]
    pub fn create(&self, context_id: &str) -> Conversation {
        let conversation = Conversation::new(Uuid::new_v4().to_string(), context_id);
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(conversation.id().to_string(), conversation.clone());

        tracing::debug!(
            name: "chat.conversation.created",
            conversation = %conversation.id(),
            context_id = %context_id,
            "Conversation created"
        );
        conversation
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<Conversation> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    /// Look up `id`, or create a fresh conversation for `context_id`.
    #[must_use]
    pub fn get_or_create(&self, id: Option<&str>, context_id: &str) -> Conversation {
        id.filter(|id| !id.is_empty())
            .and_then(|id| self.get(id))
            .unwrap_or_else(|| self.create(context_id))
    }

    /// Remove and cancel a conversation.
    pub fn remove(&self, id: &str) -> Option<Conversation> {
        let removed = self
            .inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id);
        if let Some(conversation) = &removed {
            conversation.cancel();
        }
        removed
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove conversations idle longer than `timeout`.
    ///
    /// Returns the number of conversations removed.
    pub fn cleanup_expired_with_timeout(&self, timeout: Duration) -> usize {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let before = guard.len();
        guard.retain(|_, conversation| {
            let expired = conversation.is_expired_with_timeout(timeout);
            if expired {
                conversation.cancel();
            }
            !expired
        });
        before - guard.len()
    }
}
