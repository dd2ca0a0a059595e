//! Module `commands`
//!
//! Defines the request line model: the commands a client can send, the
//! outcome of executing one, and the parser that turns a raw line into a
//! [`Command`].

use std::path::PathBuf;

/// A request parsed from one client line.
///
/// Path arguments are client-supplied and relative to the served root; they
/// are resolved and checked before anything touches the filesystem.
#[derive(Debug, PartialEq)]
pub enum Command {
    QUIT,
    NOOP,
    TREE,              // Full tree from the root
    LIST(String),      // One directory level
    OPEN(String),      // Directory listing or file contents
    RNFR(String),      // Rename source
    RNTO(String),      // Rename target base name
    DELE(String),      // Delete file or directory
    REVEAL(String),    // Open directory in the host's file browser
    UNKNOWN(String),   // Unknown verb
    MISSING(String),   // Known verb without its required argument
}

/// Represents the outcome status of executing a command.
#[derive(Debug, PartialEq)]
pub enum CommandStatus {
    Success,
    Failure(String),
    CloseConnection,
}

/// Payload that follows the reply line instead of being part of it.
#[derive(Debug, PartialEq)]
pub enum CommandData {
    /// Stream this file's bytes, then send the trailing message.
    File { path: PathBuf, trailer: String },
}

/// Struct encapsulating the full result of a command execution.
#[derive(Debug)]
pub struct CommandResult {
    pub status: CommandStatus,
    pub message: Option<String>,
    pub data: Option<CommandData>,
}

impl CommandResult {
    pub fn success(message: String) -> Self {
        Self {
            status: CommandStatus::Success,
            message: Some(message),
            data: None,
        }
    }

    pub fn failure(reason: impl Into<String>, message: String) -> Self {
        Self {
            status: CommandStatus::Failure(reason.into()),
            message: Some(message),
            data: None,
        }
    }
}

/// Parses a raw request line into the `Command` enum.
///
/// The verb is case-insensitive. Everything after the first run of
/// whitespace is the argument, so paths and names may contain spaces.
pub fn parse_command(raw: &str) -> Command {
    let trimmed = raw.trim_start().trim_end_matches(['\r', '\n']);
    let mut parts = trimmed.splitn(2, char::is_whitespace);
    let cmd = parts.next().unwrap_or("").to_ascii_uppercase();
    let arg = parts.next().unwrap_or("").trim_start();

    match cmd.as_str() {
        "QUIT" | "Q" => Command::QUIT,
        "NOOP" => Command::NOOP,
        "TREE" => Command::TREE,
        "LIST" if arg.is_empty() => Command::LIST(".".to_string()),
        "LIST" => Command::LIST(arg.to_string()),
        "OPEN" if !arg.is_empty() => Command::OPEN(arg.to_string()),
        "RNFR" if !arg.is_empty() => Command::RNFR(arg.to_string()),
        "RNTO" if !arg.is_empty() => Command::RNTO(arg.to_string()),
        "DELE" if !arg.is_empty() => Command::DELE(arg.to_string()),
        "REVEAL" if !arg.is_empty() => Command::REVEAL(arg.to_string()),
        "OPEN" | "RNFR" | "RNTO" | "DELE" | "REVEAL" => Command::MISSING(cmd),
        _ => Command::UNKNOWN(cmd),
    }
}
