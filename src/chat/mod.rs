//! Chat conversations against the relationship-memory backend.
//!
//! A send is three ordered steps: append the user message, append a
//! `Thinking...` placeholder, then replace that placeholder with the answer
//! (or a fixed fallback string). Only one send may be in flight per
//! conversation.
//!
//! # Example
//!
//! ```rust
//! use relationship_memory_web::chat::{Conversation, Origin, PLACEHOLDER_TEXT};
//!
//! let conversation = Conversation::new("c-1", "techparts");
//! let turn = conversation.begin_send("What did we agree on payment terms?")
//!     .unwrap()
//!     .unwrap();
//! assert_eq!(conversation.messages()[2].text, PLACEHOLDER_TEXT);
//!
//! turn.settle("Net 30 from invoice date.");
//! assert_eq!(conversation.messages()[2].from, Origin::Assistant);
//! assert_eq!(conversation.message_count(), 3);
//! ```

mod conversation;
pub mod exchange;
mod store;

pub use conversation::{
    ChatMessage, Conversation, Origin, PLACEHOLDER_TEXT, PendingTurn, SendError, greeting,
};
pub use exchange::SendOutcome;
pub use store::ConversationStore;
