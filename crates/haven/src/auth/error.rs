//! Authentication errors.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Gate-level authentication failure.
///
/// Missing header, wrong scheme, malformed token, bad signature and expiry
/// all collapse into this one variant: the response never tells a caller
/// which check failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Invalid or expired token")]
    Unauthorized,
}

#[derive(Debug, Serialize)]
struct AuthErrorBody {
    error: String,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = Json(AuthErrorBody {
            error: self.to_string(),
        });

        (StatusCode::UNAUTHORIZED, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_error_display() {
        assert_eq!(AuthError::Unauthorized.to_string(), "Invalid or expired token");
    }
}
