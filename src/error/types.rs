//! Error types
//!
//! Defines domain-specific error types for the storage layer and the server.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Storage module errors
///
/// Every variant that names a path carries the path the caller asked about,
/// so the failure can be reported without further context.
#[derive(Debug)]
pub enum StorageError {
    /// The entry could not be stat'ed or listed.
    ReadFailure { path: PathBuf, cause: io::Error },
    /// The requested path resolves outside the configured root.
    AccessDenied(String),
    /// A rename target with the same name already exists.
    AlreadyExists(String),
    /// The entry does not exist at call time.
    NotFound(String),
    /// The operation does not apply to this kind of entry.
    NotAllowed(String),
    /// A rename target name that is not a plain base name.
    InvalidName(String),
    /// The underlying filesystem or process call failed.
    OsError { path: PathBuf, cause: io::Error },
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::ReadFailure { path, cause } => {
                write!(f, "Failed to read {}: {}", path.display(), cause)
            }
            StorageError::AccessDenied(p) => {
                write!(f, "Access denied: {} is outside of root directory", p)
            }
            StorageError::AlreadyExists(p) => {
                write!(f, "A file or directory named {} already exists", p)
            }
            StorageError::NotFound(p) => write!(f, "Not found: {}", p),
            StorageError::NotAllowed(msg) => write!(f, "Not allowed: {}", msg),
            StorageError::InvalidName(n) => write!(f, "Invalid name: {:?}", n),
            StorageError::OsError { path, cause } => {
                write!(f, "Operation on {} failed: {}", path.display(), cause)
            }
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageError::ReadFailure { cause, .. } | StorageError::OsError { cause, .. } => {
                Some(cause)
            }
            _ => None,
        }
    }
}

impl StorageError {
    pub fn read_failure(path: impl Into<PathBuf>, cause: io::Error) -> Self {
        StorageError::ReadFailure {
            path: path.into(),
            cause,
        }
    }

    pub fn os_error(path: impl Into<PathBuf>, cause: io::Error) -> Self {
        StorageError::OsError {
            path: path.into(),
            cause,
        }
    }
}

/// General server error that encompasses all error types
#[derive(Debug)]
pub enum ServerError {
    Storage(StorageError),
    Config(config::ConfigError),
    IoError(io::Error),
    InvalidRoot(String),
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerError::Storage(e) => write!(f, "Storage error: {}", e),
            ServerError::Config(e) => write!(f, "Configuration error: {}", e),
            ServerError::IoError(e) => write!(f, "I/O error: {}", e),
            ServerError::InvalidRoot(msg) => write!(f, "Invalid root directory: {}", msg),
        }
    }
}

impl std::error::Error for ServerError {}

impl From<StorageError> for ServerError {
    fn from(error: StorageError) -> Self {
        ServerError::Storage(error)
    }
}

impl From<config::ConfigError> for ServerError {
    fn from(error: config::ConfigError) -> Self {
        ServerError::Config(error)
    }
}

impl From<io::Error> for ServerError {
    fn from(error: io::Error) -> Self {
        ServerError::IoError(error)
    }
}
