//! Command handlers module for the RAX tree server.
//!
//! Each handler resolves its path argument against the served root before
//! touching the filesystem, runs one storage operation and turns the outcome
//! into a reply. Handlers do blocking filesystem work and are run off the
//! async executor by the session loop.

use log::info;
use serde::Serialize;
use std::fs;

use crate::client::Client;
use crate::config::ServeContext;
use crate::error::StorageError;
use crate::error::handlers::{error_to_reply, handle_error};
use crate::protocol::responses::{self, format_json_response, format_response};
use crate::protocol::{Command, CommandData, CommandResult, CommandStatus};
use crate::storage::{self, validation};

/// Dispatches a received command to its corresponding handler.
pub fn handle_command(client: &mut Client, command: &Command, ctx: &ServeContext) -> CommandResult {
    // A pending rename only survives until the next command.
    let rename_from = client.take_rename_from();

    match command {
        Command::QUIT => handle_cmd_quit(),
        Command::NOOP => CommandResult::success(format_response(responses::OK, "OK")),
        Command::TREE => handle_cmd_tree(ctx),
        Command::LIST(path) => handle_cmd_list(path, ctx),
        Command::OPEN(path) => handle_cmd_open(path, ctx),
        Command::RNFR(path) => handle_cmd_rnfr(client, path, ctx),
        Command::RNTO(new_name) => handle_cmd_rnto(rename_from, new_name, ctx),
        Command::DELE(path) => handle_cmd_dele(path, ctx),
        Command::REVEAL(path) => handle_cmd_reveal(path, ctx),
        Command::MISSING(verb) => CommandResult::failure(
            "Missing argument",
            format_response(
                responses::ARGUMENT_ERROR,
                &format!("{} requires an argument", verb),
            ),
        ),
        Command::UNKNOWN(verb) => CommandResult::failure(
            "Unknown command",
            format_response(
                responses::SYNTAX_ERROR,
                &format!("Command not recognized: {}", verb),
            ),
        ),
    }
}

fn storage_failure(err: StorageError) -> CommandResult {
    handle_error(&err);
    CommandResult::failure(err.to_string(), error_to_reply(&err))
}

fn json_success<T: Serialize>(code: u16, payload: &T) -> CommandResult {
    CommandResult::success(format_json_response(code, payload))
}

/// Handles the QUIT command: signals connection close.
fn handle_cmd_quit() -> CommandResult {
    CommandResult {
        status: CommandStatus::CloseConnection,
        message: Some(format_response(responses::GOODBYE, "Goodbye")),
        data: None,
    }
}

/// Handles the TREE command: scans the whole root and replies with it as JSON.
fn handle_cmd_tree(ctx: &ServeContext) -> CommandResult {
    match storage::scan_tree(&ctx.root, &ctx.root, &ctx.filter) {
        Ok(report) => {
            info!(
                "Built tree for {} ({} top-level entries, {} skipped)",
                ctx.root.display(),
                report.root.children().len(),
                report.failures.len()
            );
            json_success(responses::OK, &report.root)
        }
        Err(e) => storage_failure(e),
    }
}

/// Handles the LIST command: one directory level as a JSON array.
fn handle_cmd_list(path: &str, ctx: &ServeContext) -> CommandResult {
    let listing = validation::resolve(&ctx.root, path)
        .and_then(|dir| storage::list_immediate_children(&dir, &ctx.root, &ctx.filter));

    match listing {
        Ok(entries) => json_success(responses::OK, &entries),
        Err(e) => storage_failure(e),
    }
}

/// Handles the OPEN command: lists a directory or streams a file.
fn handle_cmd_open(path: &str, ctx: &ServeContext) -> CommandResult {
    let resolved = match validation::resolve(&ctx.root, path) {
        Ok(resolved) => resolved,
        Err(e) => return storage_failure(e),
    };

    let metadata = match fs::metadata(&resolved) {
        Ok(metadata) => metadata,
        Err(e) => {
            return storage_failure(storage::tree::not_found_or_read_failure(
                &resolved, &ctx.root, e,
            ));
        }
    };

    if metadata.is_dir() {
        return handle_cmd_list(path, ctx);
    }

    let name = validation::base_name(&resolved);
    CommandResult {
        status: CommandStatus::Success,
        message: Some(format_response(
            responses::OPENING_TRANSFER,
            &format!("Opening {} ({} bytes)", name, metadata.len()),
        )),
        data: Some(CommandData::File {
            path: resolved,
            trailer: format_response(responses::TRANSFER_COMPLETE, "Transfer complete"),
        }),
    }
}

/// Handles the RNFR command: remembers the checked source for the next RNTO.
fn handle_cmd_rnfr(client: &mut Client, path: &str, ctx: &ServeContext) -> CommandResult {
    let resolved = match validation::resolve(&ctx.root, path) {
        Ok(resolved) => resolved,
        Err(e) => return storage_failure(e),
    };

    if let Err(e) = fs::symlink_metadata(&resolved) {
        return storage_failure(storage::tree::not_found_or_read_failure(&resolved, &ctx.root, e));
    }

    client.set_rename_from(Some(resolved));
    CommandResult::success(format_response(
        responses::PENDING_FURTHER_INFO,
        "Ready for destination name",
    ))
}

/// Handles the RNTO command: renames the RNFR source within its directory.
fn handle_cmd_rnto(
    rename_from: Option<std::path::PathBuf>,
    new_name: &str,
    ctx: &ServeContext,
) -> CommandResult {
    let Some(old_path) = rename_from else {
        return CommandResult::failure(
            "RNTO without RNFR",
            format_response(responses::BAD_SEQUENCE, "Send RNFR first"),
        );
    };

    match storage::rename_entry(&ctx.root, &old_path, new_name) {
        Ok(result) => json_success(responses::ACTION_OK, &result),
        Err(e) => storage_failure(e),
    }
}

/// Handles the DELE command: deletes a file or a whole directory.
fn handle_cmd_dele(path: &str, ctx: &ServeContext) -> CommandResult {
    let deleted = validation::resolve(&ctx.root, path)
        .and_then(|resolved| storage::delete_entry(&ctx.root, &resolved));

    match deleted {
        Ok(result) => json_success(responses::ACTION_OK, &result),
        Err(e) => storage_failure(e),
    }
}

/// Handles the REVEAL command: opens a directory in the host's file browser.
fn handle_cmd_reveal(path: &str, ctx: &ServeContext) -> CommandResult {
    let revealed = validation::resolve(&ctx.root, path)
        .and_then(|resolved| storage::reveal_directory(&ctx.root, &resolved));

    match revealed {
        Ok(opened) => CommandResult::success(format_response(
            responses::OK,
            &format!("Directory opened: {}", opened.display()),
        )),
        Err(e) => storage_failure(e),
    }
}
