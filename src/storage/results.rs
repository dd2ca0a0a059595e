//! Storage result types
//!
//! Defines the node model and the structures returned by storage operations.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::Metadata;
use std::path::PathBuf;

use crate::error::StorageError;

/// Relative path used for the root node itself.
pub const ROOT_RELATIVE_PATH: &str = ".";

/// One filesystem entry in a tree or a listing.
///
/// `children` is `Some` for every directory (possibly empty) and `None` for
/// files, and the JSON form keeps that distinction: files carry no
/// `children` key at all.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub name: String,
    /// Path relative to the configured root, `"."` for the root itself.
    pub path: String,
    /// Byte length; 0 for directories.
    pub size: u64,
    pub is_dir: bool,
    pub modified: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<Node>>,
}

impl Node {
    /// Builds a node from stat results. Directories start with an empty child list.
    pub fn from_metadata(name: String, path: String, metadata: &Metadata) -> Self {
        let is_dir = metadata.is_dir();
        Self {
            name,
            path,
            size: if is_dir { 0 } else { metadata.len() },
            is_dir,
            modified: metadata.modified().ok().map(DateTime::<Utc>::from),
            children: is_dir.then(Vec::new),
        }
    }

    /// Same fields without the child list, as served by one-level listings.
    pub fn shallow(&self) -> Self {
        Self {
            children: None,
            ..self.clone()
        }
    }

    pub fn children(&self) -> &[Node] {
        self.children.as_deref().unwrap_or(&[])
    }
}

/// A child entry that was not included in its parent's node.
#[derive(Debug)]
pub struct ScanFailure {
    pub path: PathBuf,
    pub error: StorageError,
}

/// Result of a full tree scan: the tree plus every entry that was dropped
/// because it could not be read.
#[derive(Debug)]
pub struct ScanReport {
    pub root: Node,
    pub failures: Vec<ScanFailure>,
}

/// Result of a rename operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameResult {
    pub old_path: String,
    pub new_path: String,
}

/// Result of a delete operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResult {
    pub path: String,
    pub was_dir: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file_node() -> Node {
        Node {
            name: "a.txt".into(),
            path: "a.txt".into(),
            size: 10,
            is_dir: false,
            modified: None,
            children: None,
        }
    }

    #[test]
    fn test_file_serializes_without_children() {
        let json = serde_json::to_value(file_node()).unwrap();
        assert!(json.get("children").is_none());
        assert_eq!(json["isDir"], false);
        assert_eq!(json["size"], 10);
    }

    #[test]
    fn test_empty_dir_serializes_with_empty_children() {
        let dir = Node {
            name: "empty".into(),
            path: "empty".into(),
            size: 0,
            is_dir: true,
            modified: None,
            children: Some(vec![]),
        };
        let json = serde_json::to_value(&dir).unwrap();
        assert_eq!(json["children"], serde_json::json!([]));
    }

    #[test]
    fn test_shallow_drops_children() {
        let dir = Node {
            name: "d".into(),
            path: "d".into(),
            size: 0,
            is_dir: true,
            modified: None,
            children: Some(vec![file_node()]),
        };
        assert!(dir.shallow().children.is_none());
        assert_eq!(dir.children().len(), 1);
    }
}
