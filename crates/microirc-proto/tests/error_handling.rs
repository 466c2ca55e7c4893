//! Integration tests for parse and framing failures.

use microirc_proto::{LineCodec, Message, MessageParseError, ProtocolError};
use bytes::BytesMut;
use tokio_util::codec::Decoder;

#[test]
fn test_parse_failures_are_distinct() {
    let cases = [
        ("", MessageParseError::EmptyMessage),
        ("   \r\n", MessageParseError::EmptyMessage),
        (":server.only", MessageParseError::MissingCommand),
        (":server.only    \t", MessageParseError::MissingCommand),
        (":", MessageParseError::MissingCommand),
    ];

    for (line, expected) in cases {
        assert_eq!(Message::parse_line(line), Err(expected), "line {:?}", line);
    }
}

#[test]
fn test_error_source_chaining() {
    let err = "".parse::<Message>().unwrap_err();
    assert!(err.to_string().starts_with("invalid message"));

    let source = std::error::Error::source(&err).expect("parse error should chain");
    assert_eq!(source.to_string(), "empty message");
}

#[test]
fn test_codec_recovers_after_oversized_line() {
    let mut codec = LineCodec::with_max_len(32);
    let mut buf = BytesMut::new();
    buf.extend_from_slice(format!("PRIVMSG #c :{}\r\n", "x".repeat(64)).as_bytes());
    buf.extend_from_slice(b"PING :ok\r\n");

    assert!(matches!(
        codec.decode(&mut buf),
        Err(ProtocolError::MessageTooLong { .. })
    ));
    let next = codec.decode(&mut buf).unwrap().expect("second line");
    assert_eq!(Message::parse_line(&next).unwrap().arg(0), Some("ok"));
}

#[test]
fn test_parse_examples_from_the_wire() {
    let msg = Message::parse_line("PING :hello there").unwrap();
    assert_eq!(msg.verb, "PING");
    assert_eq!(msg.params, vec!["hello there"]);

    let msg = Message::parse_line(":irc.example NOTICE foo :a message").unwrap();
    assert_eq!(msg.source.as_deref(), Some("irc.example"));
    assert_eq!(msg.verb, "NOTICE");
    assert_eq!(msg.params, vec!["foo", "a message"]);
}
