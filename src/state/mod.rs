//! Server state.
//!
//! Everything lives in one [`ServerState`] owned by the core task, so no
//! locking is involved. Keyed storage uses [`OrderedMap`].

mod channel;
mod client;
mod map;
mod server;

use std::fmt;

pub use channel::{Channel, ChannelModes, ListEntry, MemberModes};
pub use client::{Client, ConnContext, UserModes};
pub use map::OrderedMap;
pub use server::{ServerInfo, ServerState};

/// Connection identifier.
///
/// Compared by value, which makes it usable as an identity key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConnId(pub u64);

impl fmt::Display for ConnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
pub(crate) use server::tests as test_support;
