//! Request protocol implementation
//!
//! Handles request parsing, dispatch, and reply generation.

pub mod commands;
pub mod handlers;
pub mod responses;

pub use commands::{Command, CommandData, CommandResult, CommandStatus, parse_command};
pub use handlers::handle_command;
