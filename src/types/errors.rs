//! Error types shared by the registry, the stream protocol and the HTTP API

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("Session not found: {session_id}")]
    NotFound { session_id: String },

    /// The session has ended; frames are no longer accepted
    #[error("Session is not active: {session_id}")]
    NotActive { session_id: String },
}

impl SessionError {
    pub fn not_found(session_id: &str) -> Self {
        Self::NotFound { session_id: session_id.to_string() }
    }

    pub fn not_active(session_id: &str) -> Self {
        Self::NotActive { session_id: session_id.to_string() }
    }
}

/// Failures reported to a stream client as `error` messages
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Invalid message format: {0}")]
    InvalidFormat(String),

    #[error("Unknown message type: {0}")]
    UnknownType(String),

    #[error("Invalid {kind} payload: {reason}")]
    InvalidPayload { kind: &'static str, reason: String },

    #[error("Session ID is required")]
    MissingSessionId,

    #[error(transparent)]
    Session(#[from] SessionError),
}

/// HTTP-facing errors, rendered as `{success: false, message}`
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::NotFound { .. } => AppError::NotFound("Session not found".to_string()),
            SessionError::NotActive { .. } => AppError::BadRequest(err.to_string()),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal(e) => {
                tracing::error!("Internal error: {:#}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (
            status,
            Json(json!({
                "success": false,
                "message": self.to_string(),
            })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_error_maps_to_status() {
        let response = AppError::from(SessionError::not_found("abc")).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = AppError::from(SessionError::not_active("abc")).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_protocol_error_messages() {
        assert_eq!(ProtocolError::MissingSessionId.to_string(), "Session ID is required");
        assert_eq!(
            ProtocolError::from(SessionError::not_found("s1")).to_string(),
            "Session not found: s1"
        );
    }
}
