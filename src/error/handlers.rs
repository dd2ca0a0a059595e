//! Error handlers
//!
//! Maps storage errors onto protocol replies.

use crate::error::types::StorageError;
use crate::protocol::responses;
use log::{error, warn};

/// Log a storage error at a level matching its severity
pub fn handle_error(err: &StorageError) {
    match err {
        StorageError::ReadFailure { .. } | StorageError::OsError { .. } => {
            error!("Storage error: {}", err)
        }
        _ => warn!("Request rejected: {}", err),
    }
}

/// Convert error to reply code
pub fn error_to_reply_code(err: &StorageError) -> u16 {
    match err {
        StorageError::ReadFailure { .. } => responses::LOCAL_ERROR,
        StorageError::AccessDenied(_) => responses::UNAVAILABLE,
        StorageError::AlreadyExists(_) => responses::NAME_NOT_ALLOWED,
        StorageError::NotFound(_) => responses::UNAVAILABLE,
        StorageError::NotAllowed(_) => responses::NOT_IMPLEMENTED_FOR_PARAM,
        StorageError::InvalidName(_) => responses::NAME_NOT_ALLOWED,
        StorageError::OsError { .. } => responses::LOCAL_ERROR,
    }
}

/// Format a storage error as a complete reply line
pub fn error_to_reply(err: &StorageError) -> String {
    responses::format_response(error_to_reply_code(err), &err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_reply_codes() {
        let denied = StorageError::AccessDenied("../x".into());
        assert_eq!(error_to_reply_code(&denied), 550);

        let exists = StorageError::AlreadyExists("b.txt".into());
        assert_eq!(error_to_reply_code(&exists), 553);

        let not_allowed = StorageError::NotAllowed("a.txt is not a directory".into());
        assert_eq!(error_to_reply_code(&not_allowed), 504);

        let os = StorageError::os_error("/tmp/x", io::Error::other("boom"));
        assert_eq!(error_to_reply_code(&os), 451);
    }

    #[test]
    fn test_error_reply_is_single_line() {
        let err = StorageError::NotFound("missing.txt".into());
        let reply = error_to_reply(&err);
        assert_eq!(reply, "550 Not found: missing.txt\r\n");
    }
}
