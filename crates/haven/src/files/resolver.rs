//! Path resolution and home-directory confinement.

use std::path::{Component, Path, PathBuf};

use tracing::warn;

use super::FilesError;

/// Expand a leading `~` against the home root. Any other path is taken as
/// given (absolute, or relative to the server process).
fn expand(home: &Path, input: &str) -> PathBuf {
    match input.strip_prefix('~') {
        Some(rest) => home.join(rest.trim_start_matches('/')),
        None => PathBuf::from(input),
    }
}

/// Lexically normalize a path: drop `.` segments and resolve `..` upward.
/// Used only for not-yet-existing targets, where canonicalize cannot run.
fn normalize(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();

    for component in path.components() {
        match component {
            Component::ParentDir => {
                result.pop();
            }
            Component::CurDir => {}
            other => result.push(other),
        }
    }

    result
}

/// Resolve a tenant-supplied path to a canonical path confined to the
/// tenant's home root.
///
/// Canonicalization resolves symlinks and dot segments; the confinement
/// check is component-boundary aware, so a sibling such as `/home/alice2`
/// never passes for the root `/home/alice`.
pub fn resolve(home: &Path, input: &str) -> Result<PathBuf, FilesError> {
    let home_canon = home.canonicalize().map_err(|_| FilesError::InvalidPath)?;
    let target = expand(home, input);

    let canonical = target.canonicalize().map_err(|_| FilesError::InvalidPath)?;

    if !canonical.starts_with(&home_canon) {
        warn!(target = %canonical.display(), "path escapes home root");
        return Err(FilesError::AccessDenied);
    }

    Ok(canonical)
}

/// Resolve a path that may not exist yet (write/mkdir targets).
///
/// An existing target resolves like [`resolve`]. For a new target the
/// nearest existing ancestor is the parent directory, which must itself
/// canonicalize inside the home root.
pub fn resolve_for_create(home: &Path, input: &str) -> Result<PathBuf, FilesError> {
    let home_canon = home.canonicalize().map_err(|_| FilesError::InvalidPath)?;
    let target = normalize(&expand(home, input));

    if target.exists() {
        return resolve(home, input);
    }

    let parent = target.parent().ok_or(FilesError::InvalidPath)?;
    let name = target.file_name().ok_or(FilesError::InvalidPath)?;

    let parent_canon = parent.canonicalize().map_err(|_| FilesError::InvalidPath)?;
    if !parent_canon.starts_with(&home_canon) {
        warn!(target = %target.display(), "create target escapes home root");
        return Err(FilesError::AccessDenied);
    }

    Ok(parent_canon.join(name))
}

/// Rewrite a confined path for display, replacing the home root with `~`.
pub fn display_path(home_canon: &Path, path: &Path) -> String {
    match path.strip_prefix(home_canon) {
        Ok(rest) if rest.as_os_str().is_empty() => "~".to_string(),
        Ok(rest) => format!("~/{}", rest.display()),
        Err(_) => path.display().to_string(),
    }
}
