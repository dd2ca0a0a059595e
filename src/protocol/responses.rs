//! Reply handling
//!
//! Defines reply codes and formatting.

use serde::Serialize;

/// Reply codes
pub const OPENING_TRANSFER: u16 = 150;
pub const OK: u16 = 200;
pub const READY: u16 = 220;
pub const GOODBYE: u16 = 221;
pub const TRANSFER_COMPLETE: u16 = 226;
pub const ACTION_OK: u16 = 250;
pub const PENDING_FURTHER_INFO: u16 = 350;
pub const SERVICE_UNAVAILABLE: u16 = 421;
pub const LOCAL_ERROR: u16 = 451;
pub const SYNTAX_ERROR: u16 = 500;
pub const ARGUMENT_ERROR: u16 = 501;
pub const BAD_SEQUENCE: u16 = 503;
pub const NOT_IMPLEMENTED_FOR_PARAM: u16 = 504;
pub const UNAVAILABLE: u16 = 550;
pub const NAME_NOT_ALLOWED: u16 = 553;

/// Format a reply line
pub fn format_response(code: u16, message: &str) -> String {
    format!("{} {}\r\n", code, message)
}

/// Format a reply line whose text is a JSON document
pub fn format_json_response<T: Serialize>(code: u16, payload: &T) -> String {
    match serde_json::to_string(payload) {
        Ok(json) => format_response(code, &json),
        Err(e) => format_response(LOCAL_ERROR, &format!("Failed to encode reply: {}", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_response() {
        assert_eq!(format_response(GOODBYE, "Goodbye"), "221 Goodbye\r\n");
    }

    #[test]
    fn test_format_json_response() {
        let reply = format_json_response(OK, &serde_json::json!({"path": "a b"}));
        assert_eq!(reply, "200 {\"path\":\"a b\"}\r\n");
    }
}
