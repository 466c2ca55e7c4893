//! Error types for the protocol library.
//!
//! This module defines error types for line-level transport failures and
//! message parsing failures.

use thiserror::Error;

/// Convenience type alias for Results using [`ProtocolError`].
pub type Result<T, E = ProtocolError> = std::result::Result<T, E>;

/// Extract the verb from raw line bytes (for error reporting).
///
/// Works without validating UTF-8 so that a line rejected for bad encoding
/// can still be attributed to a command in the logs.
pub(crate) fn extract_command_hint(raw_line: &[u8]) -> Option<String> {
    let mut pos = 0;

    while pos < raw_line.len() && raw_line[pos].is_ascii_whitespace() {
        pos += 1;
    }

    // Skip source: `:token`
    if pos < raw_line.len() && raw_line[pos] == b':' {
        while pos < raw_line.len() && !raw_line[pos].is_ascii_whitespace() {
            pos += 1;
        }
        while pos < raw_line.len() && raw_line[pos].is_ascii_whitespace() {
            pos += 1;
        }
    }

    let cmd_start = pos;
    while pos < raw_line.len() && raw_line[pos].is_ascii_alphanumeric() {
        pos += 1;
    }

    if pos > cmd_start {
        let cmd = String::from_utf8(raw_line[cmd_start..pos].to_vec()).ok()?;
        Some(cmd.to_ascii_uppercase())
    } else {
        None
    }
}

/// Top-level protocol errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProtocolError {
    /// I/O error during reading or writing.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid UTF-8 bytes in a line.
    #[error("invalid UTF-8 in line at byte {byte_pos}: {details}")]
    InvalidUtf8 {
        /// The raw line as bytes.
        raw_line: Vec<u8>,
        /// Byte position where UTF-8 validation failed.
        byte_pos: usize,
        /// Detailed error message from the UTF-8 decoder.
        details: String,
        /// Verb extracted from the raw bytes, if any.
        command_hint: Option<String>,
    },

    /// Line exceeded the maximum allowed length.
    #[error("line too long: {actual} bytes (limit: {limit})")]
    MessageTooLong {
        /// Actual line length.
        actual: usize,
        /// Maximum allowed length.
        limit: usize,
    },

    /// Failed to parse a line into a message.
    #[error("invalid message: {string}")]
    InvalidMessage {
        /// The offending line.
        string: String,
        /// The underlying parse error.
        #[source]
        cause: MessageParseError,
    },
}

/// Errors encountered when parsing a single line.
///
/// A parse failure never carries a partially filled message.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum MessageParseError {
    /// Line was empty or contained only whitespace.
    #[error("empty message")]
    EmptyMessage,

    /// A source was present but nothing followed it.
    #[error("missing command after source")]
    MissingCommand,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ProtocolError::MessageTooLong {
            actual: 1024,
            limit: 512,
        };
        assert_eq!(format!("{}", err), "line too long: 1024 bytes (limit: 512)");
        assert_eq!(
            MessageParseError::MissingCommand.to_string(),
            "missing command after source"
        );
    }

    #[test]
    fn test_protocol_error_chaining() {
        let protocol_err = ProtocolError::InvalidMessage {
            string: ":src".to_string(),
            cause: MessageParseError::MissingCommand,
        };

        let source = std::error::Error::source(&protocol_err);
        assert!(source.is_some());
        assert_eq!(
            source.unwrap().to_string(),
            MessageParseError::MissingCommand.to_string()
        );
    }

    #[test]
    fn test_io_conversion() {
        let io_err =
            std::io::Error::new(std::io::ErrorKind::ConnectionReset, "connection reset");
        let protocol_err: ProtocolError = io_err.into();
        assert!(matches!(protocol_err, ProtocolError::Io(_)));
    }

    #[test]
    fn test_extract_command_hint() {
        assert_eq!(
            extract_command_hint(b"PRIVMSG #test hi"),
            Some("PRIVMSG".to_string())
        );
        assert_eq!(
            extract_command_hint(b"  :server notice foo :\xff"),
            Some("NOTICE".to_string())
        );
        assert_eq!(extract_command_hint(b":only"), None);
        assert_eq!(extract_command_hint(b""), None);
    }
}
