use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    routing::{delete, get, post},
};
use tokio_util::sync::CancellationToken;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::AppState;
use crate::ask::{AskBackend, HttpAskClient};
use crate::chat::ConversationStore;
use crate::config::AppConfig;
use crate::room::RoomCredentials;
use crate::web::{api, pages};

/// How often idle conversations are swept.
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Build shared state from configuration.
pub fn build_state(config: Arc<AppConfig>) -> anyhow::Result<AppState> {
    let timeout = config.ask.timeout_secs.map(Duration::from_secs);
    let ask: Arc<dyn AskBackend> = Arc::new(HttpAskClient::new(config.ask.endpoint.clone(), timeout)?);

    info!(
        name: "ask.config.loaded",
        endpoint = %config.ask.endpoint,
        timeout_secs = ?config.ask.timeout_secs,
        "Ask endpoint configured"
    );

    let room_credentials = RoomCredentials::from_config(&config.room).map(Arc::new);
    match (&room_credentials, &config.room.server_url) {
        (Some(_), Some(url)) => {
            info!(name: "room.config.loaded", server_url = %url, "Room tokens enabled");
        }
        _ => {
            info!(name: "room.config.missing", "Room tokens disabled");
        }
    }

    Ok(AppState {
        conversations: ConversationStore::new(),
        ask,
        room_credentials,
        config,
    })
}

/// All routes, with state applied.
pub fn router(state: AppState) -> Router {
    let static_dir = ServeDir::new(&state.config.server.static_dir);

    Router::new()
        // Pages
        .route("/", get(pages::index))
        .route("/client/{id}", get(pages::client_detail))
        .route("/client/{id}/chatbot", get(pages::client_chatbot))
        .route("/client/{id}/avatar", get(pages::client_avatar))
        .route("/client/{id}/knowledge-graph", get(pages::client_knowledge_graph))
        .route("/client/{id}/reels", get(pages::client_reels))
        .route("/chatbot", get(pages::chatbot))
        .route("/avatar", get(pages::avatar))
        .route("/knowledge-graph", get(pages::knowledge_graph))
        .route("/reels", get(pages::reels))
        // HTMX partials
        .route("/chat/{id}/send", post(api::chat_send))
        .route("/chat/{id}/transcript", get(api::chat_transcript))
        // JSON API
        .route("/api/chat", post(api::api_chat))
        .route("/api/chat/{id}", delete(api::api_delete_conversation))
        .route("/api/chat/{id}/messages", get(api::api_get_messages))
        .route("/api/clients", get(api::api_clients))
        .route("/api/room/token", get(api::api_room_token))
        .nest_service("/static", static_dir)
        .fallback(pages::not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Periodically drop conversations idle longer than `idle`, cancelling any
/// answer still in flight for them.
pub fn spawn_sweeper(
    store: ConversationStore,
    idle: Duration,
    shutdown: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SWEEP_INTERVAL);
        loop {
            tokio::select! {
                () = shutdown.cancelled() => break,
                _ = interval.tick() => {
                    let removed = store.cleanup_expired_with_timeout(idle);
                    if removed > 0 {
                        tracing::debug!(
                            name: "chat.sweep.completed",
                            removed,
                            remaining = store.len(),
                            "Idle conversations swept"
                        );
                    }
                }
            }
        }
    })
}

/// Start the Axum server with the provided configuration.
pub async fn start_server(config: Arc<AppConfig>) -> anyhow::Result<()> {
    let state = build_state(Arc::clone(&config))?;

    let shutdown = CancellationToken::new();
    let sweeper = spawn_sweeper(
        state.conversations.clone(),
        Duration::from_secs(config.server.conversation_idle_secs),
        shutdown.clone(),
    );

    let app = router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(
        name: "server.started",
        address = %addr,
        "Server started"
    );

    let signal = shutdown.clone();
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            info!(name: "server.shutdown", "Shutting down");
            signal.cancel();
        })
        .await?;

    shutdown.cancel();
    let _ = sweeper.await;
    Ok(())
}
