//! Network module.
//!
//! Contains the Gateway (TCP listener), per-connection tasks, and the core
//! dispatcher task that owns all server state.

mod connection;
mod dispatch;
mod gateway;

pub use connection::Connection;
pub use dispatch::{Dispatcher, Event};
pub use gateway::Gateway;
