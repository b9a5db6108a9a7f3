//! File browser handlers.
//!
//! Every handler resolves the tenant-supplied path through the confinement
//! resolver before touching the filesystem.

use axum::{
    Json,
    extract::{Query, State},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::api::error::ApiResult;
use crate::api::state::AppState;
use crate::auth::CurrentUser;
use crate::files::{
    self, FileEntry, FileInfo, FilesError, display_path, file_info, list_directory,
};

/// 1 MiB cap on file reads.
const MAX_READ_BYTES: u64 = 1024 * 1024;

/// Query parameters for the list endpoint.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Defaults to the tenant home root.
    #[serde(default = "default_path")]
    pub path: String,
}

fn default_path() -> String {
    "~".to_string()
}

/// Listing response.
#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub path: String,
    pub files: Vec<FileEntry>,
}

/// GET /api/files/list?path=
#[instrument(skip(state, query), fields(username = %user.username, path = %query.path))]
pub async fn list(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<ListResponse>> {
    let home = state.accounts.home_dir(&user.username);
    let resolved = files::resolve(&home, &query.path)?;

    if !resolved.is_dir() {
        return Err(FilesError::NotADirectory.into());
    }

    let entries = list_directory(&resolved).await?;
    let home_canon = home.canonicalize().map_err(|_| FilesError::InvalidPath)?;

    Ok(Json(ListResponse {
        path: display_path(&home_canon, &resolved),
        files: entries,
    }))
}

/// Path-carrying request body shared by read/delete/mkdir.
#[derive(Debug, Deserialize)]
pub struct PathRequest {
    #[serde(default)]
    pub path: String,
}

/// File read response.
#[derive(Debug, Serialize)]
pub struct ReadResponse {
    pub content: String,
    pub info: FileInfo,
}

/// POST /api/files/read
#[instrument(skip(state, request), fields(username = %user.username, path = %request.path))]
pub async fn read(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(request): Json<PathRequest>,
) -> ApiResult<Json<ReadResponse>> {
    let home = state.accounts.home_dir(&user.username);
    let resolved = files::resolve(&home, &request.path).map_err(not_found_on_invalid)?;

    if resolved.is_dir() {
        return Err(FilesError::NotAFile.into());
    }

    let metadata = tokio::fs::metadata(&resolved)
        .await
        .map_err(|_| FilesError::NotFound)?;
    if metadata.len() > MAX_READ_BYTES {
        return Err(FilesError::TooLarge.into());
    }

    let bytes = tokio::fs::read(&resolved).await.map_err(FilesError::from)?;
    if is_binary(&bytes) {
        return Err(FilesError::Binary.into());
    }

    let content = String::from_utf8(bytes).map_err(|_| FilesError::Binary)?;
    let home_canon = home.canonicalize().map_err(|_| FilesError::InvalidPath)?;
    let info = file_info(&home_canon, &resolved).await?;

    Ok(Json(ReadResponse { content, info }))
}

/// File write request.
#[derive(Debug, Deserialize)]
pub struct WriteRequest {
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub content: String,
}

/// Success response carrying the affected entry.
#[derive(Debug, Serialize)]
pub struct InfoResponse {
    pub success: bool,
    pub info: FileInfo,
}

/// POST /api/files/write
#[instrument(skip(state, request), fields(username = %user.username, path = %request.path))]
pub async fn write(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(request): Json<WriteRequest>,
) -> ApiResult<Json<InfoResponse>> {
    if request.path.is_empty() {
        return Err(FilesError::PathRequired.into());
    }

    let home = state.accounts.home_dir(&user.username);
    let resolved = files::resolve_for_create(&home, &request.path)?;

    if let Some(parent) = resolved.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|_| FilesError::WriteFailed)?;
    }

    tokio::fs::write(&resolved, &request.content)
        .await
        .map_err(|_| FilesError::WriteFailed)?;

    let home_canon = home.canonicalize().map_err(|_| FilesError::InvalidPath)?;
    let info = file_info(&home_canon, &resolved).await?;

    Ok(Json(InfoResponse {
        success: true,
        info,
    }))
}

/// Bare success response.
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// POST /api/files/delete
#[instrument(skip(state, request), fields(username = %user.username, path = %request.path))]
pub async fn delete(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(request): Json<PathRequest>,
) -> ApiResult<Json<SuccessResponse>> {
    let home = state.accounts.home_dir(&user.username);
    let resolved = files::resolve(&home, &request.path).map_err(not_found_on_invalid)?;

    let home_canon = home.canonicalize().map_err(|_| FilesError::InvalidPath)?;
    if resolved == home_canon {
        return Err(FilesError::HomeRoot.into());
    }

    if resolved.is_dir() {
        let mut entries = tokio::fs::read_dir(&resolved)
            .await
            .map_err(FilesError::from)?;
        if entries.next_entry().await.map_err(FilesError::from)?.is_some() {
            return Err(FilesError::NotEmpty.into());
        }

        tokio::fs::remove_dir(&resolved)
            .await
            .map_err(|_| FilesError::DeleteFailed)?;
    } else {
        tokio::fs::remove_file(&resolved)
            .await
            .map_err(|_| FilesError::DeleteFailed)?;
    }

    Ok(Json(SuccessResponse { success: true }))
}

/// POST /api/files/mkdir
#[instrument(skip(state, request), fields(username = %user.username, path = %request.path))]
pub async fn mkdir(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(request): Json<PathRequest>,
) -> ApiResult<Json<InfoResponse>> {
    if request.path.is_empty() {
        return Err(FilesError::PathRequired.into());
    }

    let home = state.accounts.home_dir(&user.username);
    let resolved = files::resolve_for_create(&home, &request.path)?;

    if tokio::fs::try_exists(&resolved).await.unwrap_or(false) {
        return Err(FilesError::AlreadyExists.into());
    }

    tokio::fs::create_dir_all(&resolved)
        .await
        .map_err(|_| FilesError::CreateDirFailed)?;

    let home_canon = home.canonicalize().map_err(|_| FilesError::InvalidPath)?;
    let info = file_info(&home_canon, &resolved).await?;

    Ok(Json(InfoResponse {
        success: true,
        info,
    }))
}

/// Read and delete report a missing target as `File not found`.
fn not_found_on_invalid(err: FilesError) -> FilesError {
    match err {
        FilesError::InvalidPath => FilesError::NotFound,
        other => other,
    }
}

/// Control bytes in the first 1 KiB mark the file as binary.
fn is_binary(bytes: &[u8]) -> bool {
    bytes
        .iter()
        .take(1024)
        .any(|b| matches!(b, 0x00..=0x08 | 0x0B | 0x0C | 0x0E..=0x1F))
}
