//! Client for the relationship-memory `/ask` endpoint.
//!
//! The endpoint takes `{question, company_id}` and answers `{answer}`. Every
//! failure mode degrades to a fixed human-readable string so callers never
//! have to surface an error to the user.
//!
//! - [`AskBackend`]: the seam the chat exchange talks to
//! - [`HttpAskClient`]: `reqwest` implementation

mod client;

pub use client::HttpAskClient;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Shown when the request never reached the backend.
pub const TRANSPORT_FAILURE_TEXT: &str = "Sorry, I couldn't process your request right now.";

/// Shown when the backend answered with a non-success status.
pub const STATUS_FAILURE_TEXT: &str = "Sorry, I couldn't reach Relationship Memory.";

/// Shown when the body is unreadable or carries no `answer`.
pub const NO_ANSWER_TEXT: &str = "No answer returned.";

/// Request body for `POST /ask`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AskRequest {
    pub question: String,
    pub company_id: String,
}

/// Response body from `POST /ask`.
///
/// `answer` is optional on the wire; a missing or `null` value is treated
/// as [`AskError::MissingAnswer`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AskResponse {
    #[serde(default)]
    pub answer: Option<String>,
}

/// Failure modes of a single ask.
#[derive(Error, Debug)]
pub enum AskError {
    /// Connection refused, DNS failure, timeout, ...
    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),

    /// Backend answered with a non-2xx status.
    #[error("backend returned status {0}")]
    Status(u16),

    /// Body was not the expected JSON shape.
    #[error("malformed response: {0}")]
    Malformed(String),

    /// Body parsed but `answer` was absent or null.
    #[error("response carried no answer")]
    MissingAnswer,
}

impl AskError {
    /// Fixed user-facing text for this failure.
    #[must_use]
    pub fn fallback_text(&self) -> &'static str {
        match self {
            Self::Transport(_) => TRANSPORT_FAILURE_TEXT,
            Self::Status(_) => STATUS_FAILURE_TEXT,
            Self::Malformed(_) | Self::MissingAnswer => NO_ANSWER_TEXT,
        }
    }
}

/// Anything that can answer a question about a company.
#[async_trait::async_trait]
pub trait AskBackend: Send + Sync {
    async fn ask(&self, request: &AskRequest) -> Result<String, AskError>;
}

/// Ask and collapse any failure into its fallback text.
///
/// The failure is logged; the caller only ever sees a displayable string.
pub async fn answer_or_fallback(backend: &dyn AskBackend, request: &AskRequest) -> String {
    match backend.ask(request).await {
        Ok(answer) => answer,
        Err(e) => {
            tracing::warn!(
                name: "chat.ask.failed",
                company_id = %request.company_id,
                error = %e,
                "Ask request failed"
            );
            e.fallback_text().to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Result<&'static str, u16>);

    #[async_trait::async_trait]
    impl AskBackend for Fixed {
        async fn ask(&self, _request: &AskRequest) -> Result<String, AskError> {
            self.0.map(ToString::to_string).map_err(AskError::Status)
        }
    }

    fn request() -> AskRequest {
        AskRequest {
            question: "What did we agree on payment terms?".into(),
            company_id: "techparts".into(),
        }
    }

    #[test]
    fn test_request_wire_shape() {
        let json = serde_json::to_value(request()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "question": "What did we agree on payment terms?",
                "company_id": "techparts"
            })
        );
    }

    #[test]
    fn test_response_tolerates_missing_answer() {
        let resp: AskResponse = serde_json::from_str("{}").unwrap();
        assert!(resp.answer.is_none());
        let resp: AskResponse = serde_json::from_str(r#"{"answer": null}"#).unwrap();
        assert!(resp.answer.is_none());
    }

    #[test]
    fn test_fallback_texts_are_distinct_and_non_empty() {
        assert_eq!(AskError::Status(500).fallback_text(), STATUS_FAILURE_TEXT);
        assert_eq!(AskError::MissingAnswer.fallback_text(), NO_ANSWER_TEXT);
        assert_eq!(AskError::Malformed("x".into()).fallback_text(), NO_ANSWER_TEXT);
        assert_ne!(TRANSPORT_FAILURE_TEXT, STATUS_FAILURE_TEXT);
    }

    #[tokio::test]
    async fn test_answer_or_fallback() {
        assert_eq!(answer_or_fallback(&Fixed(Ok("42")), &request()).await, "42");
        assert_eq!(
            answer_or_fallback(&Fixed(Err(502)), &request()).await,
            STATUS_FAILURE_TEXT
        );
    }
}
