//! `reqwest` implementation of [`AskBackend`].

use std::time::Duration;

use super::{AskBackend, AskError, AskRequest, AskResponse};

/// HTTP client for `POST /ask`.
#[derive(Clone)]
pub struct HttpAskClient {
    http: reqwest::Client,
    endpoint: String,
}

impl std::fmt::Debug for HttpAskClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpAskClient")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

impl HttpAskClient {
    /// Create a client for the given endpoint URL.
    ///
    /// `timeout` of `None` leaves requests unbounded.
    pub fn new(endpoint: impl Into<String>, timeout: Option<Duration>) -> anyhow::Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(t) = timeout {
            builder = builder.timeout(t);
        }
        Ok(Self {
            http: builder.build()?,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait::async_trait]
impl AskBackend for HttpAskClient {
    async fn ask(&self, request: &AskRequest) -> Result<String, AskError> {
        tracing::debug!(
            name: "chat.ask.sent",
            endpoint = %self.endpoint,
            company_id = %request.company_id,
            "Sending question"
        );

        let resp = self
            .http
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(AskError::Transport)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(AskError::Status(status.as_u16()));
        }

        let body = resp.bytes().await.map_err(AskError::Transport)?;
        let parsed: AskResponse =
            serde_json::from_slice(&body).map_err(|e| AskError::Malformed(e.to_string()))?;

        parsed.answer.ok_or(AskError::MissingAnswer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    fn request() -> AskRequest {
        AskRequest {
            question: "Who owns the Q4 renewal?".into(),
            company_id: "acme".into(),
        }
    }

    #[tokio::test]
    async fn test_ask_success() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/ask")
            .match_header("content-type", "application/json")
            .match_body(Matcher::Json(serde_json::json!({
                "question": "Who owns the Q4 renewal?",
                "company_id": "acme"
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"answer": "Martin does."}"#)
            .create_async()
            .await;

        let client = HttpAskClient::new(format!("{}/ask", server.url()), None).unwrap();
        let answer = client.ask(&request()).await.unwrap();

        assert_eq!(answer, "Martin does.");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_ask_non_success_status() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/ask")
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let client = HttpAskClient::new(format!("{}/ask", server.url()), None).unwrap();
        let err = client.ask(&request()).await.unwrap_err();

        assert!(matches!(err, AskError::Status(500)));
    }

    #[tokio::test]
    async fn test_ask_missing_answer() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/ask")
            .with_status(200)
            .with_body(r#"{"detail": "nothing"}"#)
            .create_async()
            .await;

        let client = HttpAskClient::new(format!("{}/ask", server.url()), None).unwrap();
        let err = client.ask(&request()).await.unwrap_err();

        assert!(matches!(err, AskError::MissingAnswer));
    }

    #[tokio::test]
    async fn test_ask_malformed_body() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/ask")
            .with_status(200)
            .with_body("<html>not json</html>")
            .create_async()
            .await;

        let client = HttpAskClient::new(format!("{}/ask", server.url()), None).unwrap();
        let err = client.ask(&request()).await.unwrap_err();

        assert!(matches!(err, AskError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_ask_transport_failure() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = HttpAskClient::new(format!("http://{addr}/ask"), None).unwrap();
        let err = client.ask(&request()).await.unwrap_err();

        assert!(matches!(err, AskError::Transport(_)));
    }
}
