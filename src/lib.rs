//! Relationship Memory web client
//!
//! A server-rendered front end for a relationship-memory service: client
//! overview pages, a per-account chat that forwards questions to an external
//! `/ask` endpoint, and a join flow for a real-time avatar room.
//!
//! # Architecture
//!
//! - **Server**: Axum router serving HTML pages, HTMX partials, and a JSON API
//! - **Chat**: in-memory conversations with a single pending answer each
//! - **Ask**: HTTP client for the question/answer backend
//! - **Room**: access tokens and a websocket signalling client
//!
//! # Modules
//!
//! - [`ask`]: `/ask` request/response types and HTTP client
//! - [`chat`]: conversations, the send exchange, and the store
//! - [`clients`]: static client and project catalogue
//! - [`context`]: context (company) identifier resolution
//! - [`room`]: room tokens, signalling, and session lifecycle
//! - [`web`]: page, partial, and API handlers

// Allow pedantic clippy warnings that don't add value for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::missing_fields_in_debug)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::cargo_common_metadata)]
#![allow(clippy::multiple_crate_versions)]
#![allow(clippy::unused_async)]

pub mod ask;
pub mod chat;
pub mod clients;
pub mod config;
pub mod context;
pub mod room;
pub mod server;
pub mod telemetry;
pub mod web;

use std::sync::Arc;

use ask::AskBackend;
use chat::ConversationStore;
use config::AppConfig;
use room::RoomCredentials;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Open conversations.
    pub conversations: ConversationStore,
    /// Question/answer backend.
    pub ask: Arc<dyn AskBackend>,
    /// Room token source; `None` when rooms are not configured.
    pub room_credentials: Option<Arc<RoomCredentials>>,
    /// Global Configuration
    pub config: Arc<AppConfig>,
}
