//! Bearer-token authentication middleware.

use axum::{
    extract::{FromRequestParts, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use super::{AuthError, TokenService};

/// Extract a bearer token from an Authorization header value.
///
/// The scheme prefix must be exactly `Bearer ` (case-sensitive, single
/// space).
fn bearer_token(header_value: &str) -> Option<&str> {
    let token = header_value.strip_prefix("Bearer ")?;
    if token.is_empty() { None } else { Some(token) }
}

/// Authentication state shared across protected routes.
#[derive(Clone)]
pub struct AuthGate {
    tokens: TokenService,
}

impl AuthGate {
    /// Create a gate around a token service.
    pub fn new(tokens: TokenService) -> Self {
        Self { tokens }
    }

    /// Resolve an Authorization header value to a verified username.
    ///
    /// Every failure maps to the same uniform [`AuthError`]; callers get no
    /// oracle for probing which check rejected them.
    pub fn authenticate(&self, header_value: Option<&str>) -> Result<String, AuthError> {
        let header = header_value.ok_or(AuthError::Unauthorized)?;
        let token = bearer_token(header).ok_or(AuthError::Unauthorized)?;

        self.tokens.verify(token).map_err(|err| {
            debug!(error = %err, "token verification failed");
            AuthError::Unauthorized
        })
    }
}

/// Authenticated user extracted from request extensions.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    /// Verified username; downstream handlers never re-derive identity.
    pub username: String,
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or(AuthError::Unauthorized)
    }
}

/// Authentication middleware.
///
/// Verifies the bearer token and injects [`CurrentUser`] into request
/// extensions for downstream handlers.
pub async fn auth_middleware(
    State(gate): State<AuthGate>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let username = gate.authenticate(header)?;
    req.extensions_mut().insert(CurrentUser { username });

    Ok(next.run(req).await)
}
