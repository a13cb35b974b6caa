//! Unified server error type.
//!
//! Every handler returns `Result<T, ServerError>`, which implements
//! [`axum::response::IntoResponse`] so errors are automatically converted
//! to a `{ "error": ... }` JSON body with an appropriate status code.
//!
//! Internal errors (database, unclassified) are logged with full detail but
//! only a generic message is returned to the caller, so SQL and file paths
//! never leak to clients.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// All errors that can occur in the review-server request lifecycle.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Propagated from the SQLite store.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A required field was missing, empty, or malformed.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The model identifier is not a registered model reference.
    #[error("model not found: {0}")]
    ModelNotFound(String),

    /// The review id does not resolve to a stored review.
    #[error("review not found: {0}")]
    ReviewNotFound(i64),

    /// The caller referenced some other resource that does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Missing session, insufficient role, or bad credentials.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// An unclassified internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServerError {
    /// The rejection rendered by the access gate.
    pub fn forbidden() -> Self {
        ServerError::Unauthorized("Forbidden".into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::BadRequest(_)
            | ServerError::ModelNotFound(_)
            | ServerError::ReviewNotFound(_) => StatusCode::BAD_REQUEST,
            ServerError::NotFound(_) => StatusCode::NOT_FOUND,
            ServerError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ServerError::Database(_) | ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        let client_message = match &self {
            // Client-facing errors: expose the message directly.
            ServerError::BadRequest(m) | ServerError::NotFound(m) | ServerError::Unauthorized(m) => m.clone(),
            ServerError::ModelNotFound(_) => "Model not found".to_owned(),
            ServerError::ReviewNotFound(_) => "Review not found".to_owned(),

            // Internal errors: log the full detail, return a generic message.
            ServerError::Database(e) => {
                error!(error = %e, "database error");
                "internal server error".to_owned()
            }
            ServerError::Internal(m) => {
                error!(message = %m, "internal server error");
                "internal server error".to_owned()
            }
        };
        (status, Json(json!({ "error": client_message }))).into_response()
    }
}
