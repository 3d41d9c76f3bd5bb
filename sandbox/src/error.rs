//! Sandbox error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SandboxError {
    #[error("session not found: {0}")]
    SessionNotFound(String),

    #[error("session {0} already settled")]
    AlreadySettled(String),

    #[error("failed to generate session id: {0}")]
    Entropy(String),

    #[error("server error: {0}")]
    Server(String),
}

impl IntoResponse for SandboxError {
    fn into_response(self) -> Response {
        let status = match &self {
            SandboxError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            SandboxError::AlreadySettled(_) => StatusCode::CONFLICT,
            SandboxError::Entropy(_) | SandboxError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}
