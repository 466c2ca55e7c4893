//! Line-framed codec for tokio.
//!
//! Decodes `\n`-terminated lines (a trailing `\r` is stripped) and encodes
//! [`Message`]s with a `\r\n` terminator.

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};
use tracing::trace;

use crate::error::{self, ProtocolError};
use crate::Message;

/// Default maximum line length in bytes, terminator included.
pub const DEFAULT_MAX_LINE_LEN: usize = 512;

/// Line codec with a length cap.
///
/// A line longer than the cap is reported as [`ProtocolError::MessageTooLong`]
/// once; the rest of it, up to the next `\n`, is discarded.
#[derive(Debug)]
pub struct LineCodec {
    /// Index of the next byte to scan for `\n`.
    next_index: usize,
    max_len: usize,
    /// Skipping the tail of an oversized line.
    discarding: bool,
}

impl LineCodec {
    /// Codec with the standard 512-byte limit.
    pub fn new() -> Self {
        Self::with_max_len(DEFAULT_MAX_LINE_LEN)
    }

    /// Codec with a custom limit.
    pub fn with_max_len(max_len: usize) -> Self {
        Self {
            next_index: 0,
            max_len,
            discarding: false,
        }
    }
}

impl Default for LineCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for LineCodec {
    type Item = String;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> error::Result<Option<String>> {
        if self.discarding {
            match src.iter().position(|b| *b == b'\n') {
                Some(offset) => {
                    let _ = src.split_to(offset + 1);
                    self.discarding = false;
                }
                None => {
                    src.clear();
                    return Ok(None);
                }
            }
        }

        let Some(offset) = src[self.next_index..].iter().position(|b| *b == b'\n') else {
            self.next_index = src.len();
            if src.len() > self.max_len {
                let actual = src.len();
                src.clear();
                self.next_index = 0;
                self.discarding = true;
                trace!(actual, limit = self.max_len, "discarding oversized line");
                return Err(ProtocolError::MessageTooLong {
                    actual,
                    limit: self.max_len,
                });
            }
            return Ok(None);
        };

        let line = src.split_to(self.next_index + offset + 1);
        self.next_index = 0;

        if line.len() > self.max_len {
            return Err(ProtocolError::MessageTooLong {
                actual: line.len(),
                limit: self.max_len,
            });
        }

        let mut body = &line[..line.len() - 1];
        if let [rest @ .., b'\r'] = body {
            body = rest;
        }

        match std::str::from_utf8(body) {
            Ok(s) => Ok(Some(s.to_owned())),
            Err(e) => Err(ProtocolError::InvalidUtf8 {
                raw_line: body.to_vec(),
                byte_pos: e.valid_up_to(),
                details: e.to_string(),
                command_hint: error::extract_command_hint(body),
            }),
        }
    }
}

impl Encoder<Message> for LineCodec {
    type Error = ProtocolError;

    fn encode(&mut self, msg: Message, dst: &mut BytesMut) -> error::Result<()> {
        let text = msg.to_string();
        dst.reserve(text.len() + 2);
        dst.extend_from_slice(text.as_bytes());
        dst.extend_from_slice(b"\r\n");
        Ok(())
    }
}
