//! Authentication handlers.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::api::error::ApiResult;
use crate::api::state::AppState;

/// Credentials supplied to register and login.
#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Successful register/login response.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub success: bool,
    pub username: String,
    pub token: String,
}

/// POST /api/auth/register
#[instrument(skip(state, request), fields(username = %request.username))]
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<CredentialsRequest>,
) -> ApiResult<Json<SessionResponse>> {
    let record = state
        .users
        .register(&request.username, &request.password)
        .await?;

    let token = state.tokens.issue(&record.username);

    Ok(Json(SessionResponse {
        success: true,
        username: record.username,
        token,
    }))
}

/// POST /api/auth/login
#[instrument(skip(state, request), fields(username = %request.username))]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<CredentialsRequest>,
) -> ApiResult<Json<SessionResponse>> {
    let record = state
        .users
        .login(&request.username, &request.password)
        .await?;

    let token = state.tokens.issue(&record.username);

    Ok(Json(SessionResponse {
        success: true,
        username: record.username,
        token,
    }))
}

/// Token verification request.
#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub username: String,
}

/// Token verification response.
#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

/// POST /api/auth/verify
///
/// Valid only when the token verifies AND its embedded username matches the
/// claimed one; every failure mode is the same `{valid: false}`.
pub async fn verify(
    State(state): State<AppState>,
    Json(request): Json<VerifyRequest>,
) -> Json<VerifyResponse> {
    match state.tokens.verify(&request.token) {
        Ok(username) if username == request.username => Json(VerifyResponse {
            valid: true,
            username: Some(username),
        }),
        _ => Json(VerifyResponse {
            valid: false,
            username: None,
        }),
    }
}
