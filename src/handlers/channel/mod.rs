//! Channel command handlers.
//!
//! Handles JOIN, PART, NAMES commands.

mod join;
mod names;
mod part;

pub use join::JoinHandler;
pub use names::NamesHandler;
pub use part::PartHandler;
