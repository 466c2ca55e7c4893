//! `FromStr` for [`Message`] built on the nom parser.

use std::str::FromStr;

use crate::error::ProtocolError;

use super::nom_parser::ParsedLine;
use super::types::Message;

impl Message {
    /// Parse one line into a message, returning the bare parse error.
    ///
    /// A trailing `\r\n` (or lone `\n`) is ignored. The verb is uppercased.
    pub fn parse_line(line: &str) -> Result<Message, crate::MessageParseError> {
        let line = line.trim_end_matches(['\r', '\n']);
        let parsed = ParsedLine::parse(line)?;

        Ok(Message {
            source: parsed.source.map(str::to_owned),
            verb: parsed.verb.to_ascii_uppercase(),
            params: parsed.params.iter().map(|p| (*p).to_owned()).collect(),
        })
    }
}

impl FromStr for Message {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Message, Self::Err> {
        Message::parse_line(s).map_err(|cause| ProtocolError::InvalidMessage {
            string: s.to_owned(),
            cause,
        })
    }
}
