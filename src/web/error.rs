use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::chat::SendError;
use crate::room::RoomError;

/// Errors returned by JSON API handlers.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0} not found")]
    NotFound(String),

    #[error(transparent)]
    Send(#[from] SendError),

    #[error("conversation belongs to {actual}, not {requested}")]
    ContextMismatch { requested: String, actual: String },

    #[error(transparent)]
    Room(#[from] RoomError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Send(SendError::Busy) => StatusCode::CONFLICT,
            // A closed conversation has already left the store.
            Self::Send(SendError::Closed) => StatusCode::NOT_FOUND,
            Self::ContextMismatch { .. } => StatusCode::BAD_REQUEST,
            Self::Room(RoomError::MissingCredentials | RoomError::MissingServerUrl) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            Self::Room(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(name: "api.error", status = %status, error = %self, "Request failed");
        }
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::from(SendError::Busy).status(), StatusCode::CONFLICT);
        assert_eq!(ApiError::from(SendError::Closed).status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::ContextMismatch {
                requested: "a".into(),
                actual: "b".into()
            }
            .status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(RoomError::MissingServerUrl).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ApiError::from(RoomError::UnsupportedScheme("ftp".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
