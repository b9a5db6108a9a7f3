//! Directory listing and entry metadata.

use std::path::Path;
use std::time::UNIX_EPOCH;

use serde::Serialize;

use super::{FilesError, resolver::display_path};

/// Entry kind, serialized as `directory` / `file`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Directory,
    File,
}

/// One listing entry.
#[derive(Debug, Clone, Serialize)]
pub struct FileEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    /// Byte size; 0 for anything that is not a regular file.
    pub size: u64,
    /// Modification time as epoch seconds.
    pub modified: i64,
}

/// Entry metadata plus its display path, returned by read/write/mkdir.
#[derive(Debug, Clone, Serialize)]
pub struct FileInfo {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub size: u64,
    pub modified: i64,
}

fn modified_epoch(metadata: &std::fs::Metadata) -> i64 {
    metadata
        .modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// List the immediate entries of a confined directory.
///
/// Directories sort before files; within each group names sort
/// case-insensitively.
pub async fn list_directory(dir: &Path) -> Result<Vec<FileEntry>, FilesError> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut files = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        let metadata = entry.metadata().await?;
        let kind = if metadata.is_dir() {
            EntryKind::Directory
        } else {
            EntryKind::File
        };

        files.push(FileEntry {
            name: entry.file_name().to_string_lossy().to_string(),
            kind,
            size: if metadata.is_file() { metadata.len() } else { 0 },
            modified: modified_epoch(&metadata),
        });
    }

    files.sort_by_key(|e| (e.kind != EntryKind::Directory, e.name.to_lowercase()));

    Ok(files)
}

/// Build [`FileInfo`] for a confined path.
pub async fn file_info(home_canon: &Path, path: &Path) -> Result<FileInfo, FilesError> {
    let metadata = tokio::fs::metadata(path).await?;
    let kind = if metadata.is_dir() {
        EntryKind::Directory
    } else {
        EntryKind::File
    };

    Ok(FileInfo {
        name: path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "~".to_string()),
        path: display_path(home_canon, path),
        kind,
        size: if metadata.is_file() { metadata.len() } else { 0 },
        modified: modified_epoch(&metadata),
    })
}
