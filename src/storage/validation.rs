//! Path validation
//!
//! Resolves client-supplied paths against the configured root and enforces
//! that the result stays inside it.
//!
//! Containment is checked on lexically normalized paths, one component at a
//! time. Symlinks are not followed: a link inside the root that points
//! outside of it passes this check.

use std::path::{Component, Path, PathBuf};

use crate::error::StorageError;
use crate::storage::results::ROOT_RELATIVE_PATH;

/// Collapses `.` and `..` segments without touching the filesystem.
///
/// `..` at the filesystem root stays at the root.
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::ParentDir => {
                normalized.pop();
            }
            Component::CurDir => {}
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

/// Resolves `user_path` relative to `root` and rejects anything outside it.
///
/// `root` must already be absolute and normalized. A leading `/` (or drive
/// prefix) on `user_path` is dropped, so `/docs` names `<root>/docs`.
pub fn resolve(root: &Path, user_path: &str) -> Result<PathBuf, StorageError> {
    let relative: PathBuf = Path::new(user_path)
        .components()
        .filter(|c| !matches!(c, Component::RootDir | Component::Prefix(_)))
        .collect();
    let resolved = normalize_lexically(&root.join(relative));

    if !resolved.starts_with(root) {
        return Err(StorageError::AccessDenied(user_path.to_string()));
    }

    Ok(resolved)
}

/// Path of `path` relative to `root`, `"."` for the root itself.
///
/// Falls back to the base name when `path` is not under `root`.
pub fn relative_path(root: &Path, path: &Path) -> String {
    match path.strip_prefix(root) {
        Ok(rel) if rel.as_os_str().is_empty() => ROOT_RELATIVE_PATH.to_string(),
        Ok(rel) => rel.to_string_lossy().to_string(),
        Err(_) => base_name(path),
    }
}

/// Final component of `path`, or the whole path when it has none (e.g. `/`).
pub fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}

/// A rename target must be a single plain path component.
pub fn validate_base_name(name: &str) -> Result<(), StorageError> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(first)), None)
            if first == name && !name.contains(['/', '\\']) =>
        {
            Ok(())
        }
        _ => Err(StorageError::InvalidName(name.to_string())),
    }
}
