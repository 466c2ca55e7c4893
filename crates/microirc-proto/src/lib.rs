//! # microirc-proto
//!
//! Protocol primitives for the microircd relay chat daemon.
//!
//! ## Features
//!
//! - Line parsing into a structured [`Message`] (source, verb, bounded parameters)
//! - Message serialization for outgoing traffic
//! - Numeric reply codes ([`Response`])
//! - RFC 1459 casemapping and nick/channel name validation
//! - Mode-string tokenizing and formatting
//! - Optional Tokio line codec
//!
//! ## Parsing
//!
//! ```rust
//! use microirc_proto::Message;
//!
//! let msg: Message = ":irc.example NOTICE foo :a message".parse().unwrap();
//! assert_eq!(msg.source.as_deref(), Some("irc.example"));
//! assert_eq!(msg.verb, "NOTICE");
//! assert_eq!(msg.params.as_slice(), ["foo", "a message"]);
//! ```
//!
//! ## Building replies
//!
//! ```rust
//! use microirc_proto::Message;
//!
//! let pong = Message::new("PONG", ["irc.example.net", "token"]).with_source("irc.example.net");
//! assert_eq!(pong.to_string(), ":irc.example.net PONG irc.example.net token");
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod casemap;
pub mod chan;
pub mod error;
#[cfg(feature = "tokio")]
pub mod line;
pub mod message;
pub mod mode;
pub mod nick;
pub mod response;
pub mod util;

pub use self::casemap::{irc_eq, irc_lower_char, irc_to_lower};
pub use self::chan::{ChannelExt, DEFAULT_CHANNEL_MAX_LEN};
pub use self::error::{MessageParseError, ProtocolError};
#[cfg(feature = "tokio")]
pub use self::line::{LineCodec, DEFAULT_MAX_LINE_LEN};
pub use self::message::{Message, MAX_PARAMS};
pub use self::mode::{ModeChange, ModeSign, ModeTokens};
pub use self::nick::{NickExt, DEFAULT_NICK_MAX_LEN};
pub use self::response::Response;
pub use self::util::wildcard_match;
