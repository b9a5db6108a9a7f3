//! Tenant file access: path confinement and directory operations.
//!
//! Every path a tenant supplies is resolved and canonicalized, then checked
//! against the tenant's home root with a component-boundary test before any
//! filesystem operation runs.

mod listing;
mod resolver;

pub use listing::{EntryKind, FileEntry, FileInfo, file_info, list_directory};
pub use resolver::{display_path, resolve, resolve_for_create};

use thiserror::Error;

/// File operation failures.
///
/// Display strings are the exact client-visible messages.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilesError {
    #[error("Invalid path")]
    InvalidPath,

    #[error("Access denied")]
    AccessDenied,

    #[error("Not a directory")]
    NotADirectory,

    #[error("File not found")]
    NotFound,

    #[error("Cannot read directory as file")]
    NotAFile,

    #[error("File too large (max 1MB)")]
    TooLarge,

    #[error("Binary file")]
    Binary,

    #[error("Path required")]
    PathRequired,

    #[error("Path already exists")]
    AlreadyExists,

    #[error("Directory not empty")]
    NotEmpty,

    #[error("Cannot delete home directory")]
    HomeRoot,

    #[error("Failed to write file")]
    WriteFailed,

    #[error("Failed to delete file")]
    DeleteFailed,

    #[error("Failed to create directory")]
    CreateDirFailed,

    #[error("File operation failed: {0}")]
    Io(String),
}

impl From<std::io::Error> for FilesError {
    fn from(err: std::io::Error) -> Self {
        FilesError::Io(err.to_string())
    }
}
