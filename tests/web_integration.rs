use std::sync::Arc;
use std::time::Duration;

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use mockito::Matcher;
use serde_json::{Value, json};
use tokio::sync::Notify;

use relationship_memory_web::AppState;
use relationship_memory_web::ask::{
    AskBackend, AskError, AskRequest, STATUS_FAILURE_TEXT, TRANSPORT_FAILURE_TEXT,
};
use relationship_memory_web::chat::PLACEHOLDER_TEXT;
use relationship_memory_web::config::{
    AppConfig, AskConfig, ChatConfig, DEFAULT_COMPANY_ID, DEFAULT_ROOM, RoomConfig, ServerConfig,
};
use relationship_memory_web::server;

fn test_config(ask_endpoint: &str) -> AppConfig {
    AppConfig {
        server: ServerConfig {
            port: 0,
            host: "127.0.0.1".into(),
            static_dir: "static".into(),
            conversation_idle_secs: 60,
        },
        ask: AskConfig {
            endpoint: ask_endpoint.into(),
            timeout_secs: Some(5),
        },
        chat: ChatConfig {
            default_company_id: DEFAULT_COMPANY_ID.into(),
        },
        room: RoomConfig {
            server_url: None,
            token: None,
            api_key: None,
            api_secret: None,
            default_room: DEFAULT_ROOM.into(),
            token_ttl_secs: 600,
            adaptive_stream: true,
            dynacast: true,
        },
    }
}

fn test_server(config: AppConfig) -> TestServer {
    let state = server::build_state(Arc::new(config)).unwrap();
    TestServer::new(server::router(state)).unwrap()
}

/// Backend that answers only once released.
struct Gated {
    gate: Arc<Notify>,
}

#[async_trait::async_trait]
impl AskBackend for Gated {
    async fn ask(&self, _request: &AskRequest) -> Result<String, AskError> {
        self.gate.notified().await;
        Ok("late answer".into())
    }
}

fn gated_server() -> (TestServer, AppState, Arc<Notify>) {
    let gate = Arc::new(Notify::new());
    let mut state = server::build_state(Arc::new(test_config(&closed_port_endpoint()))).unwrap();
    state.ask = Arc::new(Gated {
        gate: Arc::clone(&gate),
    });
    let server = TestServer::new(server::router(state.clone())).unwrap();
    (server, state, gate)
}

async fn open_session(server: &TestServer, company_id: &str) -> String {
    let body: Value = server
        .post("/api/chat")
        .json(&json!({ "message": "", "company_id": company_id }))
        .await
        .json();
    body["session_id"].as_str().unwrap().to_string()
}

async fn wait_until_settled(state: &AppState, id: &str) {
    let conversation = state.conversations.get(id).unwrap();
    for _ in 0..100 {
        if !conversation.is_pending() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("conversation {id} still pending");
}

fn closed_port_endpoint() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{port}/ask")
}

#[tokio::test]
async fn test_pages_render() {
    let server = test_server(test_config(&closed_port_endpoint()));

    let home = server.get("/").await;
    home.assert_status_ok();
    let body = home.text();
    assert!(body.contains("Never lose the context"));
    assert!(body.contains(r#"href="/client/google""#));
    assert!(body.contains("Product Development"));

    for path in [
        "/client/google",
        "/client/google/chatbot",
        "/client/google/avatar",
        "/client/google/knowledge-graph",
        "/client/google/reels",
        "/chatbot",
        "/avatar",
        "/knowledge-graph",
        "/reels",
    ] {
        server.get(path).await.assert_status_ok();
    }
}

#[tokio::test]
async fn test_unknown_routes_are_404() {
    let server = test_server(test_config(&closed_port_endpoint()));

    let missing = server.get("/client/nobody").await;
    missing.assert_status(StatusCode::NOT_FOUND);
    assert!(missing.text().contains("Client not found"));

    let missing = server.get("/no/such/page").await;
    missing.assert_status(StatusCode::NOT_FOUND);
    assert!(missing.text().contains("Oops! Page not found"));
}

#[tokio::test]
async fn test_client_chatbot_page_scopes_conversation() {
    let server = test_server(test_config(&closed_port_endpoint()));

    let body = server.get("/client/meta/chatbot").await.text();
    assert!(body.contains(r#"name="company_id" value="meta""#));
    assert!(body.contains("Ask me anything about meta."));

    let body = server.get("/chatbot").await.text();
    assert!(body.contains(r#"name="company_id" value="techparts""#));
}

#[tokio::test]
async fn test_api_chat_answers() {
    let mut ask = mockito::Server::new_async().await;
    let mock = ask
        .mock("POST", "/ask")
        .match_body(Matcher::Json(json!({
            "question": "  What did we agree on payment terms?  ",
            "company_id": "acme"
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"answer":"Net 30."}"#)
        .create_async()
        .await;

    let server = test_server(test_config(&format!("{}/ask", ask.url())));

    let response = server
        .post("/api/chat")
        .json(&json!({
            "message": "  What did we agree on payment terms?  ",
            "company_id": "acme"
        }))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["company_id"], "acme");
    let messages = body["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[0]["from"], "system");
    assert_eq!(messages[1]["from"], "user");
    assert_eq!(messages[1]["text"], "  What did we agree on payment terms?  ");
    assert_eq!(messages[2]["from"], "assistant");
    assert_eq!(messages[2]["text"], "Net 30.");

    mock.assert_async().await;

    let session_id = body["session_id"].as_str().unwrap();
    let stored: Value = server
        .get(&format!("/api/chat/{session_id}/messages"))
        .await
        .json();
    assert_eq!(stored.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_api_chat_context_from_current_url() {
    let mut ask = mockito::Server::new_async().await;
    let mock = ask
        .mock("POST", "/ask")
        .match_body(Matcher::PartialJson(json!({ "company_id": "google" })))
        .with_status(200)
        .with_body(r#"{"answer":"ok"}"#)
        .create_async()
        .await;

    let server = test_server(test_config(&format!("{}/ask", ask.url())));

    let body: Value = server
        .post("/api/chat")
        .add_header(
            HeaderName::from_static("hx-current-url"),
            HeaderValue::from_static("http://localhost:3000/client/google/chatbot"),
        )
        .json(&json!({ "message": "status?" }))
        .await
        .json();

    assert_eq!(body["company_id"], "google");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_api_chat_failure_texts() {
    let mut ask = mockito::Server::new_async().await;
    let _mock = ask
        .mock("POST", "/ask")
        .with_status(502)
        .create_async()
        .await;

    let server = test_server(test_config(&format!("{}/ask", ask.url())));
    let body: Value = server
        .post("/api/chat")
        .json(&json!({ "message": "hello" }))
        .await
        .json();
    assert_eq!(body["company_id"], DEFAULT_COMPANY_ID);
    assert_eq!(body["messages"][2]["text"], STATUS_FAILURE_TEXT);

    let server = test_server(test_config(&closed_port_endpoint()));
    let body: Value = server
        .post("/api/chat")
        .json(&json!({ "message": "hello" }))
        .await
        .json();
    assert_eq!(body["messages"][2]["text"], TRANSPORT_FAILURE_TEXT);
}

#[tokio::test]
async fn test_api_chat_blank_message_is_ignored() {
    let server = test_server(test_config(&closed_port_endpoint()));

    let body: Value = server
        .post("/api/chat")
        .json(&json!({ "message": "   " }))
        .await
        .json();
    let messages = body["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["from"], "system");
}

#[tokio::test]
async fn test_delete_conversation() {
    let server = test_server(test_config(&closed_port_endpoint()));

    let body: Value = server
        .post("/api/chat")
        .json(&json!({ "message": "" }))
        .await
        .json();
    let session_id = body["session_id"].as_str().unwrap().to_string();

    server
        .delete(&format!("/api/chat/{session_id}"))
        .await
        .assert_status(StatusCode::NO_CONTENT);
    server
        .delete(&format!("/api/chat/{session_id}"))
        .await
        .assert_status(StatusCode::NOT_FOUND);
    server
        .get(&format!("/api/chat/{session_id}/messages"))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_htmx_send_returns_pending_transcript() {
    let server = test_server(test_config(&closed_port_endpoint()));

    let body: Value = server
        .post("/api/chat")
        .json(&json!({ "message": "", "company_id": "x" }))
        .await
        .json();
    let session_id = body["session_id"].as_str().unwrap().to_string();

    let fragment = server
        .post(&format!("/chat/{session_id}/send"))
        .form(&[("message", "anything new?"), ("company_id", "x")])
        .await;
    fragment.assert_status_ok();
    let html = fragment.text();
    assert!(html.contains(&format!(r#"id="transcript-{session_id}""#)));
    assert!(html.contains("anything new?"));

    server
        .get("/chat/unknown/transcript")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_api_clients() {
    let server = test_server(test_config(&closed_port_endpoint()));

    let body: Value = server.get("/api/clients").await.json();
    let clients = body["clients"].as_array().unwrap();
    assert_eq!(clients.len(), 4);
    assert_eq!(clients[0]["id"], "tacto");
    assert_eq!(clients[0]["healthScore"], 85);
    assert_eq!(body["internal_projects"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_room_token_unconfigured() {
    let server = test_server(test_config(&closed_port_endpoint()));

    server
        .get("/api/room/token")
        .await
        .assert_status(StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_room_token_minted() {
    let mut config = test_config(&closed_port_endpoint());
    config.room.server_url = Some("wss://rooms.example".into());
    config.room.api_key = Some("APIkey".into());
    config.room.api_secret = Some("s3cret".into());
    let server = test_server(config);

    let response = server
        .get("/api/room/token")
        .add_query_param("identity", "alice")
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["identity"], "alice");
    assert_eq!(body["room"], DEFAULT_ROOM);
    assert_eq!(body["url"], "wss://rooms.example");
    assert_eq!(body["token"].as_str().unwrap().split('.').count(), 3);
}

#[tokio::test]
async fn test_overlapping_sends_are_rejected() {
    let (server, state, gate) = gated_server();
    let id = open_session(&server, "acme").await;

    server
        .post(&format!("/chat/{id}/send"))
        .form(&[("message", "first"), ("company_id", "acme")])
        .await
        .assert_status_ok();

    let busy = server
        .post("/api/chat")
        .json(&json!({ "message": "second", "session_id": id }))
        .await;
    busy.assert_status(StatusCode::CONFLICT);

    let html = server
        .post(&format!("/chat/{id}/send"))
        .form(&[("message", "third"), ("company_id", "acme")])
        .await
        .text();
    assert!(!html.contains("third"));

    let messages: Value = server.get(&format!("/api/chat/{id}/messages")).await.json();
    assert_eq!(messages.as_array().unwrap().len(), 3);
    assert_eq!(messages[2]["text"], PLACEHOLDER_TEXT);

    gate.notify_one();
    wait_until_settled(&state, &id).await;

    let messages: Value = server.get(&format!("/api/chat/{id}/messages")).await.json();
    assert_eq!(messages.as_array().unwrap().len(), 3);
    assert_eq!(messages[2]["text"], "late answer");
}

#[tokio::test]
async fn test_delete_discards_answer_in_flight() {
    let (server, state, gate) = gated_server();
    let id = open_session(&server, "acme").await;

    server
        .post(&format!("/chat/{id}/send"))
        .form(&[("message", "hello"), ("company_id", "acme")])
        .await
        .assert_status_ok();
    let conversation = state.conversations.get(&id).unwrap();

    server
        .delete(&format!("/api/chat/{id}"))
        .await
        .assert_status(StatusCode::NO_CONTENT);
    gate.notify_one();
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(conversation.message_count(), 3);
    assert_eq!(conversation.messages()[2].text, PLACEHOLDER_TEXT);
}

#[tokio::test]
async fn test_abandoned_request_still_settles() {
    let (server, state, gate) = gated_server();
    let id = open_session(&server, "acme").await;

    let request = server
        .post("/api/chat")
        .json(&json!({ "message": "hello", "session_id": id }));
    assert!(
        tokio::time::timeout(Duration::from_millis(50), request)
            .await
            .is_err()
    );

    gate.notify_one();
    wait_until_settled(&state, &id).await;
    assert_eq!(
        state.conversations.get(&id).unwrap().messages()[2].text,
        "late answer"
    );

    gate.notify_one();
    server
        .post("/api/chat")
        .json(&json!({ "message": "again", "session_id": id }))
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn test_conflicting_company_is_rejected() {
    let server = test_server(test_config(&closed_port_endpoint()));
    let id = open_session(&server, "acme").await;

    server
        .post("/api/chat")
        .json(&json!({ "message": "hello", "session_id": id, "company_id": "google" }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    let messages: Value = server.get(&format!("/api/chat/{id}/messages")).await.json();
    assert_eq!(messages.as_array().unwrap().len(), 1);

    server
        .post("/api/chat")
        .json(&json!({ "message": "", "session_id": id, "company_id": "acme" }))
        .await
        .assert_status_ok();
}
