//! IRC command handlers.
//!
//! This module contains the Handler trait and command registry for dispatching
//! incoming IRC messages to appropriate handlers. Handlers run synchronously
//! against the server state and queue their replies on client senders.

mod channel;
mod connection;
mod core;
mod helpers;
mod messaging;
mod mode;

pub use self::core::{Context, Handler, Registry};

pub use channel::{JoinHandler, NamesHandler, PartHandler};
pub use connection::{NickHandler, PingHandler, PongHandler, QuitHandler, UserHandler};
pub use messaging::MessageHandler;
pub use mode::ModeHandler;
