use std::fmt;
use std::io;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use bridge_protocol::ErrorResponse;

/// Failures on the `/ask` path; each one becomes a JSON `{error}` reply.
#[derive(Debug)]
pub(crate) enum AskError {
    Invalid(String),
    Body { status: StatusCode, message: String },
    Busy { limit: usize },
    Spawn(io::Error),
    Internal(String),
}

impl AskError {
    pub(crate) fn status(&self) -> StatusCode {
        match self {
            AskError::Invalid(_) => StatusCode::BAD_REQUEST,
            AskError::Body { status, .. } => *status,
            AskError::Busy { .. } => StatusCode::SERVICE_UNAVAILABLE,
            AskError::Spawn(_) | AskError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for AskError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AskError::Invalid(message) => f.write_str(message),
            AskError::Body { message, .. } => f.write_str(message),
            AskError::Busy { limit } => {
                write!(f, "too many requests in flight (limit {limit})")
            }
            AskError::Spawn(err) => write!(f, "{err}"),
            AskError::Internal(message) => f.write_str(message),
        }
    }
}

impl std::error::Error for AskError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AskError::Spawn(err) => Some(err),
            _ => None,
        }
    }
}

impl IntoResponse for AskError {
    fn into_response(self) -> Response {
        (self.status(), Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}
