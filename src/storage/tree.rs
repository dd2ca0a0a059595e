//! Tree building
//!
//! Recursively snapshots a directory subtree into [`Node`]s.
//!
//! Children appear in the order the platform's directory listing returns
//! them. No sorting is applied, so the order differs between platforms and
//! filesystems.
//!
//! Only the entry a scan starts from must be readable. Below it, an entry
//! that cannot be stat'ed is left out of its parent and a directory that
//! cannot be listed comes back with no children; both are recorded in the
//! [`ScanReport`]. Entries whose names are not valid UTF-8 are treated the
//! same way.

use log::{debug, warn};
use std::fs::{self, DirEntry};
use std::io;
use std::path::Path;

use crate::error::StorageError;
use crate::storage::filter::{FilterConfig, SkipReason};
use crate::storage::results::{Node, ScanFailure, ScanReport};
use crate::storage::validation::{base_name, relative_path};

/// Outcome of visiting one directory entry.
#[derive(Debug)]
pub enum EntryOutcome {
    Built(Node),
    Skipped { name: String, reason: SkipReason },
    Failed(ScanFailure),
}

/// Builds the tree rooted at `path`. Relative paths are computed against `root`.
pub fn build_tree(path: &Path, root: &Path, filter: &FilterConfig) -> Result<Node, StorageError> {
    scan_tree(path, root, filter).map(|report| report.root)
}

/// Like [`build_tree`], also returning the entries that were dropped.
pub fn scan_tree(
    path: &Path,
    root: &Path,
    filter: &FilterConfig,
) -> Result<ScanReport, StorageError> {
    let mut failures = Vec::new();
    let root_node = build_node(path, root, filter, &mut failures)?;

    if !failures.is_empty() {
        warn!(
            "Scan of {} skipped {} unreadable entries",
            path.display(),
            failures.len()
        );
    }

    Ok(ScanReport {
        root: root_node,
        failures,
    })
}

fn build_node(
    path: &Path,
    root: &Path,
    filter: &FilterConfig,
    failures: &mut Vec<ScanFailure>,
) -> Result<Node, StorageError> {
    let metadata = fs::metadata(path).map_err(|e| StorageError::read_failure(path, e))?;
    let mut node = Node::from_metadata(base_name(path), relative_path(root, path), &metadata);

    if !node.is_dir {
        return Ok(node);
    }

    let entries = match fs::read_dir(path) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Failed to list {}: {}", path.display(), e);
            failures.push(ScanFailure {
                path: path.to_path_buf(),
                error: StorageError::read_failure(path, e),
            });
            return Ok(node);
        }
    };

    let mut children = Vec::new();
    for entry in entries {
        match visit_entry(entry, path, root, filter, failures) {
            EntryOutcome::Built(child) => children.push(child),
            EntryOutcome::Skipped { name, reason } => {
                if reason == SkipReason::IgnoredDirectory {
                    debug!("Ignoring directory: {}", name);
                }
            }
            EntryOutcome::Failed(failure) => {
                warn!("Error scanning {}: {}", failure.path.display(), failure.error);
                failures.push(failure);
            }
        }
    }
    node.children = Some(children);

    Ok(node)
}

fn visit_entry(
    entry: io::Result<DirEntry>,
    parent: &Path,
    root: &Path,
    filter: &FilterConfig,
    failures: &mut Vec<ScanFailure>,
) -> EntryOutcome {
    let entry = match entry {
        Ok(entry) => entry,
        Err(e) => {
            return EntryOutcome::Failed(ScanFailure {
                path: parent.to_path_buf(),
                error: StorageError::read_failure(parent, e),
            });
        }
    };

    let child_path = entry.path();
    let Ok(name) = entry.file_name().into_string() else {
        return EntryOutcome::Failed(ScanFailure {
            error: StorageError::read_failure(&child_path, non_utf8_name()),
            path: child_path,
        });
    };
    if let Some(reason) = filter.exclusion(&name, entry_is_dir(&entry)) {
        return EntryOutcome::Skipped { name, reason };
    }

    match build_node(&child_path, root, filter, failures) {
        Ok(child) => EntryOutcome::Built(child),
        Err(error) => EntryOutcome::Failed(ScanFailure {
            path: child_path,
            error,
        }),
    }
}

/// Lists one directory level with the same filtering as a tree build.
///
/// Returned nodes never carry children. Entries whose metadata cannot be
/// read, or whose name is not valid UTF-8, are left out.
pub fn list_immediate_children(
    dir: &Path,
    root: &Path,
    filter: &FilterConfig,
) -> Result<Vec<Node>, StorageError> {
    let metadata = fs::metadata(dir).map_err(|e| not_found_or_read_failure(dir, root, e))?;
    if !metadata.is_dir() {
        return Err(StorageError::NotAllowed(format!(
            "{} is not a directory",
            relative_path(root, dir)
        )));
    }

    let entries = fs::read_dir(dir).map_err(|e| StorageError::read_failure(dir, e))?;

    let mut listing = Vec::new();
    for entry in entries.flatten() {
        let Ok(name) = entry.file_name().into_string() else {
            debug!("Skipping {} in listing: name is not valid UTF-8", entry.path().display());
            continue;
        };
        if filter.exclusion(&name, entry_is_dir(&entry)).is_some() {
            continue;
        }

        let child_path = entry.path();
        match fs::metadata(&child_path) {
            Ok(metadata) => {
                let node = Node::from_metadata(name, relative_path(root, &child_path), &metadata);
                listing.push(node.shallow());
            }
            Err(e) => debug!("Skipping {} in listing: {}", child_path.display(), e),
        }
    }

    Ok(listing)
}

pub(crate) fn not_found_or_read_failure(path: &Path, root: &Path, e: io::Error) -> StorageError {
    if e.kind() == io::ErrorKind::NotFound {
        StorageError::NotFound(relative_path(root, path))
    } else {
        StorageError::read_failure(path, e)
    }
}

/// Node names must join back to the entry they were read from.
fn non_utf8_name() -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, "file name is not valid UTF-8")
}

fn entry_is_dir(entry: &DirEntry) -> bool {
    entry.file_type().map(|t| t.is_dir()).unwrap_or(false)
}
