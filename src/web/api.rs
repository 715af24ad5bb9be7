//! JSON API and HTMX partial handlers.

use std::sync::Arc;

use axum::{
    Form, Json,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::Html,
};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::chat::{ChatMessage, Conversation, SendError, exchange};
use crate::clients::{self, ClientRecord};
use crate::context::resolve_context_id;
use crate::room::{IssuedToken, RoomError};

use super::error::ApiError;
use super::html;

// ─────────────────────────────────────────────────────────────────────────────
// JSON API
// ─────────────────────────────────────────────────────────────────────────────

/// Request body for `POST /api/chat`.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    /// Existing conversation; a new one is created when absent or unknown.
    #[serde(default)]
    pub session_id: Option<String>,
    /// Explicit context identifier. Must match the conversation's context
    /// when `session_id` names an existing one.
    #[serde(default)]
    pub company_id: Option<String>,
}

/// Response from `POST /api/chat`.
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub session_id: String,
    pub company_id: String,
    pub messages: Vec<ChatMessage>,
}

impl From<&Conversation> for ChatResponse {
    fn from(conversation: &Conversation) -> Self {
        Self {
            session_id: conversation.id().to_string(),
            company_id: conversation.context_id().to_string(),
            messages: conversation.messages(),
        }
    }
}

/// Path of the page the request was made from, if the client told us.
///
/// HTMX sends `HX-Current-URL`; browsers send `Referer`.
fn current_path(headers: &HeaderMap) -> String {
    ["hx-current-url", "referer"]
        .iter()
        .find_map(|name| headers.get(*name).and_then(|v| v.to_str().ok()))
        .unwrap_or_default()
        .to_string()
}

/// POST `/api/chat` - ask a question and wait for the answer.
///
/// The answer is fetched on a spawned task, so a client that gives up early
/// still leaves the conversation settled.
pub async fn api_chat(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let context = resolve_context_id(
        req.company_id.as_deref(),
        &current_path(&headers),
        &state.config.chat.default_company_id,
    );
    let conversation = state
        .conversations
        .get_or_create(req.session_id.as_deref(), &context);

    if let Some(explicit) = req.company_id.as_deref().filter(|c| !c.trim().is_empty()) {
        if explicit != conversation.context_id() {
            return Err(ApiError::ContextMismatch {
                requested: explicit.to_string(),
                actual: conversation.context_id().to_string(),
            });
        }
    }

    tracing::info!(
        name: "chat.request.received",
        conversation = %conversation.id(),
        company_id = %conversation.context_id(),
        "Received chat request"
    );

    exchange::send_detached(&conversation, Arc::clone(&state.ask), &req.message).await?;
    Ok(Json(ChatResponse::from(&conversation)))
}

/// GET `/api/chat/{id}/messages`
pub async fn api_get_messages(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<ChatMessage>>, ApiError> {
    state
        .conversations
        .get(&id)
        .map(|c| Json(c.messages()))
        .ok_or_else(|| ApiError::NotFound(format!("conversation {id}")))
}

/// DELETE `/api/chat/{id}` - drop a conversation and any answer still in flight.
pub async fn api_delete_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state
        .conversations
        .remove(&id)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or_else(|| ApiError::NotFound(format!("conversation {id}")))
}

#[derive(Debug, Serialize)]
pub struct ClientsResponse {
    pub clients: &'static [ClientRecord],
    pub internal_projects: &'static [ClientRecord],
}

/// GET `/api/clients`
pub async fn api_clients() -> Json<ClientsResponse> {
    Json(ClientsResponse {
        clients: clients::CLIENTS,
        internal_projects: clients::INTERNAL_PROJECTS,
    })
}

#[derive(Debug, Deserialize)]
pub struct TokenQuery {
    #[serde(default)]
    pub identity: Option<String>,
    #[serde(default)]
    pub room: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    #[serde(flatten)]
    pub issued: IssuedToken,
    pub url: String,
}

/// GET `/api/room/token` - access token for a browser participant.
pub async fn api_room_token(
    State(state): State<AppState>,
    Query(query): Query<TokenQuery>,
) -> Result<Json<TokenResponse>, ApiError> {
    let url = state
        .config
        .room
        .server_url
        .clone()
        .filter(|u| !u.trim().is_empty())
        .ok_or(RoomError::MissingServerUrl)?;
    let credentials = state
        .room_credentials
        .as_ref()
        .ok_or(RoomError::MissingCredentials)?;

    let issued = credentials.issue(query.identity.as_deref(), query.room.as_deref())?;
    Ok(Json(TokenResponse { issued, url }))
}

// ─────────────────────────────────────────────────────────────────────────────
// HTMX partials
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SendForm {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub company_id: Option<String>,
}

/// POST `/chat/{id}/send` - append the question, answer in the background,
/// and return the transcript with the placeholder showing.
pub async fn chat_send(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Form(form): Form<SendForm>,
) -> Html<String> {
    let conversation = state.conversations.get(&id).unwrap_or_else(|| {
        let context = resolve_context_id(
            form.company_id.as_deref(),
            &current_path(&headers),
            &state.config.chat.default_company_id,
        );
        state.conversations.create(&context)
    });

    match conversation.begin_send(&form.message) {
        Ok(Some(turn)) => {
            tokio::spawn(exchange::complete(turn, Arc::clone(&state.ask)));
        }
        Ok(None) => {}
        Err(e @ (SendError::Busy | SendError::Closed)) => {
            tracing::debug!(
                name: "chat.send.rejected",
                conversation = %conversation.id(),
                reason = %e,
                "Send rejected"
            );
        }
    }

    Html(html::transcript(&conversation))
}

/// GET `/chat/{id}/transcript`
pub async fn chat_transcript(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Html<String>, StatusCode> {
    state
        .conversations
        .get(&id)
        .map(|c| Html(html::transcript(&c)))
        .ok_or(StatusCode::NOT_FOUND)
}
