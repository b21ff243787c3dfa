//! Space Controller error types.
//!
//! Errors map to HTTP status codes for API responses. Internal details
//! are logged server-side; clients get safe messages.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;
use voice_engine::{EngineError, ParameterError};

/// Space Controller error type.
#[derive(Debug, Error)]
pub enum ScError {
    /// Engine rejected the operation.
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    /// No zone with the given id exists in this session.
    #[error("Zone not found: {0}")]
    ZoneNotFound(Uuid),

    /// Zone definition carried invalid audio parameters.
    #[error("Invalid zone definition: {0}")]
    InvalidZone(#[from] ParameterError),

    /// Internal error (actor mailbox closed, reply dropped).
    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl ScError {
    /// HTTP status for this error.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            ScError::Engine(EngineError::InvalidParticipant(_))
            | ScError::Engine(EngineError::UnknownOverride(_))
            | ScError::ZoneNotFound(_) => StatusCode::NOT_FOUND,
            ScError::InvalidZone(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ScError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-safe message (no internal details).
    #[must_use]
    pub fn client_message(&self) -> String {
        match self {
            ScError::Engine(e) => e.to_string(),
            ScError::ZoneNotFound(_) => "Zone not found".to_string(),
            ScError::InvalidZone(e) => e.to_string(),
            ScError::Internal(_) => "An internal error occurred".to_string(),
        }
    }
}

impl IntoResponse for ScError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorBody {
            error: self.client_message(),
        };
        (status, Json(body)).into_response()
    }
}
