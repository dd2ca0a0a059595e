//! Storage operations
//!
//! Mutations on entries that have already passed [`resolve`]. Each function
//! takes the resolved absolute path plus the root, which is only used to
//! report paths back relative to it.
//!
//! [`resolve`]: crate::storage::validation::resolve

use log::{error, info};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::StorageError;
use crate::storage::results::{DeleteResult, RenameResult};
use crate::storage::tree::not_found_or_read_failure;
use crate::storage::validation::{relative_path, validate_base_name};

/// Renames an entry within its own parent directory.
pub fn rename_entry(
    root: &Path,
    old_path: &Path,
    new_name: &str,
) -> Result<RenameResult, StorageError> {
    validate_base_name(new_name)?;

    let old_relative = relative_path(root, old_path);
    let parent = match old_path.parent() {
        Some(parent) if old_path != root => parent,
        _ => return Err(StorageError::NotAllowed("cannot rename the root directory".into())),
    };

    fs::symlink_metadata(old_path).map_err(|e| not_found_or_read_failure(old_path, root, e))?;

    let new_path = parent.join(new_name);
    if fs::symlink_metadata(&new_path).is_ok() {
        return Err(StorageError::AlreadyExists(relative_path(root, &new_path)));
    }

    fs::rename(old_path, &new_path).map_err(|e| {
        error!(
            "Failed to rename {} to {}: {}",
            old_path.display(),
            new_path.display(),
            e
        );
        match e.kind() {
            io::ErrorKind::NotFound => StorageError::NotFound(old_relative.clone()),
            _ => StorageError::os_error(old_path, e),
        }
    })?;

    let new_relative = relative_path(root, &new_path);
    info!("Renamed {} to {}", old_relative, new_relative);

    Ok(RenameResult {
        old_path: old_relative,
        new_path: new_relative,
    })
}

/// Deletes a file, or a directory with everything below it.
pub fn delete_entry(root: &Path, path: &Path) -> Result<DeleteResult, StorageError> {
    if path == root {
        return Err(StorageError::NotAllowed("cannot delete the root directory".into()));
    }

    let relative = relative_path(root, path);
    let metadata = fs::symlink_metadata(path).map_err(|e| not_found_or_read_failure(path, root, e))?;

    let was_dir = metadata.is_dir();
    let removed = if was_dir {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };

    removed.map_err(|e| {
        error!("Failed to delete {}: {}", path.display(), e);
        match e.kind() {
            io::ErrorKind::NotFound => StorageError::NotFound(relative.clone()),
            _ => StorageError::os_error(path, e),
        }
    })?;

    info!("Deleted {} ({})", relative, if was_dir { "directory" } else { "file" });

    Ok(DeleteResult {
        path: relative,
        was_dir,
    })
}

/// Opens a directory in the platform's file browser.
///
/// Waits for the launcher (`open`, `explorer` or `xdg-open`) to exit; a
/// non-zero exit status is reported as [`StorageError::OsError`].
pub fn reveal_directory(root: &Path, path: &Path) -> Result<PathBuf, StorageError> {
    let metadata = fs::metadata(path).map_err(|e| not_found_or_read_failure(path, root, e))?;
    if !metadata.is_dir() {
        return Err(StorageError::NotAllowed(format!(
            "{} is not a directory",
            relative_path(root, path)
        )));
    }

    run_reveal(reveal_command(path)?, path)?;

    info!("Opened {} in file browser", path.display());
    Ok(path.to_path_buf())
}

fn run_reveal(mut command: Command, path: &Path) -> Result<(), StorageError> {
    let status = command
        .status()
        .map_err(|e| StorageError::os_error(path, e))?;

    if !status.success() {
        error!(
            "File browser launcher {:?} failed for {}: {}",
            command.get_program(),
            path.display(),
            status
        );
        return Err(StorageError::os_error(
            path,
            io::Error::other(format!(
                "{} exited with {}",
                command.get_program().to_string_lossy(),
                status
            )),
        ));
    }

    Ok(())
}

fn reveal_command(path: &Path) -> Result<Command, StorageError> {
    let program = if cfg!(target_os = "macos") {
        "open"
    } else if cfg!(windows) {
        "explorer"
    } else if cfg!(target_os = "linux") {
        "xdg-open"
    } else {
        return Err(StorageError::os_error(
            path,
            io::Error::new(
                io::ErrorKind::Unsupported,
                format!("unsupported operating system: {}", std::env::consts::OS),
            ),
        ));
    };

    let mut command = Command::new(program);
    command.arg(path);
    Ok(command)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;

    fn create_test_dir() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().expect("create temp dir");
        let root = dir.path().canonicalize().unwrap();
        fs::create_dir_all(root.join("docs/deep")).unwrap();
        File::create(root.join("docs/deep/notes.md"))
            .unwrap()
            .write_all(b"notes")
            .unwrap();
        File::create(root.join("docs/a.txt"))
            .unwrap()
            .write_all(b"a")
            .unwrap();
        File::create(root.join("docs/b.txt"))
            .unwrap()
            .write_all(b"b")
            .unwrap();
        (dir, root)
    }

    #[test]
    fn test_rename_within_parent() {
        let (_guard, root) = create_test_dir();
        let result = rename_entry(&root, &root.join("docs/a.txt"), "c.txt").unwrap();

        assert_eq!(result.old_path, Path::new("docs").join("a.txt").to_string_lossy());
        assert_eq!(result.new_path, Path::new("docs").join("c.txt").to_string_lossy());
        assert!(!root.join("docs/a.txt").exists());
        assert_eq!(fs::read(root.join("docs/c.txt")).unwrap(), b"a");
    }

    #[test]
    fn test_rename_collision_leaves_both_untouched() {
        let (_guard, root) = create_test_dir();
        let err = rename_entry(&root, &root.join("docs/a.txt"), "b.txt").unwrap_err();

        assert!(matches!(err, StorageError::AlreadyExists(_)));
        assert_eq!(fs::read(root.join("docs/a.txt")).unwrap(), b"a");
        assert_eq!(fs::read(root.join("docs/b.txt")).unwrap(), b"b");
    }

    #[test]
    fn test_rename_rejects_relocating_names() {
        let (_guard, root) = create_test_dir();
        for name in ["../a.txt", "deep/a.txt", "..", ""] {
            let err = rename_entry(&root, &root.join("docs/a.txt"), name).unwrap_err();
            assert!(matches!(err, StorageError::InvalidName(_)), "{name}");
        }
        assert!(root.join("docs/a.txt").exists());
    }

    #[test]
    fn test_rename_root_and_missing() {
        let (_guard, root) = create_test_dir();
        let err = rename_entry(&root, &root, "other").unwrap_err();
        assert!(matches!(err, StorageError::NotAllowed(_)));

        let err = rename_entry(&root, &root.join("docs/zzz"), "yyy").unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[test]
    fn test_delete_directory_recursively() {
        let (_guard, root) = create_test_dir();
        let result = delete_entry(&root, &root.join("docs")).unwrap();

        assert!(result.was_dir);
        assert_eq!(result.path, "docs");
        assert!(!root.join("docs").exists());
    }

    #[test]
    fn test_delete_file() {
        let (_guard, root) = create_test_dir();
        let result = delete_entry(&root, &root.join("docs/b.txt")).unwrap();

        assert!(!result.was_dir);
        assert!(!root.join("docs/b.txt").exists());
        assert!(root.join("docs/a.txt").exists());
    }

    #[test]
    fn test_delete_missing_changes_nothing() {
        let (_guard, root) = create_test_dir();
        let err = delete_entry(&root, &root.join("docs/missing")).unwrap_err();

        assert!(matches!(err, StorageError::NotFound(_)));
        assert_eq!(fs::read_dir(root.join("docs")).unwrap().count(), 3);
    }

    #[test]
    fn test_delete_root_not_allowed() {
        let (_guard, root) = create_test_dir();
        let err = delete_entry(&root, &root).unwrap_err();
        assert!(matches!(err, StorageError::NotAllowed(_)));
        assert!(root.exists());
    }

    #[test]
    fn test_reveal_rejects_files() {
        let (_guard, root) = create_test_dir();
        let err = reveal_directory(&root, &root.join("docs/a.txt")).unwrap_err();
        assert!(matches!(err, StorageError::NotAllowed(_)));

        let err = reveal_directory(&root, &root.join("nothing")).unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[cfg(unix)]
    #[test]
    fn test_reveal_launcher_exit_status() {
        let (_guard, root) = create_test_dir();

        let mut failing = Command::new("false");
        failing.arg(&root);
        let err = run_reveal(failing, &root).unwrap_err();
        match err {
            StorageError::OsError { path, cause } => {
                assert_eq!(path, root);
                assert!(cause.to_string().contains("false exited with"), "{cause}");
            }
            other => panic!("unexpected error: {:?}", other),
        }

        let mut succeeding = Command::new("true");
        succeeding.arg(&root);
        assert!(run_reveal(succeeding, &root).is_ok());
    }

    #[test]
    fn test_reveal_missing_launcher_is_os_error() {
        let (_guard, root) = create_test_dir();
        let command = Command::new("rax-tree-no-such-launcher");
        let err = run_reveal(command, &root).unwrap_err();
        assert!(matches!(err, StorageError::OsError { .. }));
    }
}
