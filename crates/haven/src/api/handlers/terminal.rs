//! Terminal execution handler.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::auth::CurrentUser;

/// Command execution request.
#[derive(Debug, Deserialize)]
pub struct ExecRequest {
    #[serde(default)]
    pub command: String,
}

/// Command execution response.
///
/// `error` appears only when the command exited non-zero with non-empty
/// stderr; a failing-but-silent command returns just `output`.
#[derive(Debug, Serialize)]
pub struct ExecResponse {
    pub output: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// POST /api/terminal/exec
#[instrument(skip(state, request), fields(username = %user.username))]
pub async fn exec(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(request): Json<ExecRequest>,
) -> ApiResult<Json<ExecResponse>> {
    let home = state
        .accounts
        .ensure_home(&user.username)
        .await
        .map_err(ApiError::Internal)?;

    let outcome = state
        .sandbox
        .run(&request.command, &user.username, &home)
        .await?;

    Ok(Json(ExecResponse {
        output: outcome.output,
        error: outcome.error,
    }))
}
