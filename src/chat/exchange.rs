//! Drives one question/answer round trip against an [`AskBackend`].

use std::sync::Arc;

use crate::ask::{AskBackend, answer_or_fallback};

use super::conversation::{Conversation, PendingTurn, SendError};

/// What happened to a send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Input was blank; nothing was appended.
    Ignored,
    /// The placeholder was replaced with an answer or fallback text.
    Answered,
    /// The conversation was cancelled before the answer arrived.
    Discarded,
}

/// Append, ask, and settle in one call.
pub async fn send(
    conversation: &Conversation,
    backend: &dyn AskBackend,
    input: &str,
) -> Result<SendOutcome, SendError> {
    match conversation.begin_send(input)? {
        None => Ok(SendOutcome::Ignored),
        Some(turn) => Ok(finish(turn, backend).await),
    }
}

/// Like [`send`], but the answer is awaited on a spawned task.
///
/// Dropping the returned future (a client that disconnects mid-request) does
/// not abandon the turn; the answer still lands in the conversation.
pub async fn send_detached(
    conversation: &Conversation,
    backend: Arc<dyn AskBackend>,
    input: &str,
) -> Result<SendOutcome, SendError> {
    let Some(turn) = conversation.begin_send(input)? else {
        return Ok(SendOutcome::Ignored);
    };
    match tokio::spawn(complete(turn, backend)).await {
        Ok(outcome) => Ok(outcome),
        Err(e) => {
            tracing::error!(
                name: "chat.turn.join_failed",
                conversation = %conversation.id(),
                error = %e,
                "Answer task ended abnormally"
            );
            Ok(SendOutcome::Answered)
        }
    }
}

/// Ask a single question outside any stored conversation.
///
/// Returns `None` for blank input; otherwise the answer or fallback text.
pub async fn ask_once(backend: &dyn AskBackend, context_id: &str, question: &str) -> Option<String> {
    let conversation = Conversation::new("once", context_id);
    match send(&conversation, backend, question).await {
        Ok(SendOutcome::Answered) => conversation.messages().pop().map(|m| m.text),
        _ => None,
    }
}

/// Second half of a send, for callers that append first and answer later
/// (e.g. from a spawned task).
pub async fn complete(turn: PendingTurn, backend: Arc<dyn AskBackend>) -> SendOutcome {
    finish(turn, backend.as_ref()).await
}

async fn finish(turn: PendingTurn, backend: &dyn AskBackend) -> SendOutcome {
    let text = tokio::select! {
        () = turn.cancelled() => {
            tracing::debug!(
                name: "chat.turn.discarded",
                conversation = %turn.conversation().id(),
                "Conversation closed while waiting for answer"
            );
            return SendOutcome::Discarded;
        }
        text = answer_or_fallback(backend, turn.request()) => text,
    };

    if turn.settle(text) {
        SendOutcome::Answered
    } else {
        SendOutcome::Discarded
    }
}
