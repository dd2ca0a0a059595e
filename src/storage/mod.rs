//! File system storage management
//!
//! Builds tree snapshots of the served directory, guards client paths and
//! performs the rename, delete and reveal operations.

pub mod filter;
pub mod operations;
pub mod results;
pub mod tree;
pub mod validation;

pub use filter::{FilterConfig, HIDDEN_MARKER, SkipReason};
pub use operations::{delete_entry, rename_entry, reveal_directory};
pub use results::{DeleteResult, Node, ROOT_RELATIVE_PATH, RenameResult, ScanFailure, ScanReport};
pub use tree::{EntryOutcome, build_tree, list_immediate_children, scan_tree};
pub use validation::{normalize_lexically, relative_path, resolve};
