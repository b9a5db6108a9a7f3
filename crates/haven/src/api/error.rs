//! API boundary error handling.
//!
//! Business-logic failures are part of the wire contract: they return HTTP
//! 200 with an `{"error": "..."}` body. Only the authentication gate uses
//! 401 (see [`crate::auth::AuthError`]). Nothing escapes as a bare
//! protocol-level fault.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::files::FilesError;
use crate::terminal::TerminalError;
use crate::user::UserError;

/// Boundary error type for all handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    User(#[from] UserError),

    #[error(transparent)]
    Terminal(#[from] TerminalError),

    #[error(transparent)]
    Files(#[from] FilesError),

    /// Unexpected internal failure, surfaced as a plain message.
    #[error("{0}")]
    Internal(#[from] anyhow::Error),
}

/// Result type for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(ref err) = self {
            error!(error = ?err, "internal error");
        }

        let body = Json(ErrorBody {
            error: self.to_string(),
        });

        (StatusCode::OK, body).into_response()
    }
}
