//! Module `client`
//!
//! Defines the `Client` struct holding per-connection session state.

use std::path::PathBuf;

/// Represents the state of a connected client.
///
/// The only state carried between commands is the source of a pending
/// rename, set by RNFR and consumed by the next command.
#[derive(Debug, Default)]
pub struct Client {
    rename_from: Option<PathBuf>,
}

impl Client {
    /// Resolved source path of a pending rename.
    pub fn rename_from(&self) -> Option<&PathBuf> {
        self.rename_from.as_ref()
    }

    pub fn set_rename_from(&mut self, path: Option<PathBuf>) {
        self.rename_from = path;
    }

    /// Clears and returns the pending rename source.
    pub fn take_rename_from(&mut self) -> Option<PathBuf> {
        self.rename_from.take()
    }
}
