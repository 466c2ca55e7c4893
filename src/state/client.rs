//! Per-connection client state.

use bitflags::bitflags;
use microirc_proto::Message;
use tokio::sync::mpsc;
use tracing::debug;

use super::{ConnId, OrderedMap};

/// Registration state of a connection.
///
/// Scopes which commands the registry will dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnContext {
    /// Connected, NICK/USER not yet complete.
    Unregistered,
    /// Registered client.
    User,
    /// Peer server link.
    Server,
}

impl ConnContext {
    pub const ALL: [ConnContext; 3] = [
        ConnContext::Unregistered,
        ConnContext::User,
        ConnContext::Server,
    ];

    #[inline]
    pub fn index(self) -> usize {
        match self {
            ConnContext::Unregistered => 0,
            ConnContext::User => 1,
            ConnContext::Server => 2,
        }
    }
}

bitflags! {
    /// User mode bits.
    #[derive(Default)]
    pub struct UserModes: u32 {
        const INVISIBLE = 0x01; // +i
        const WALLOPS = 0x02;   // +w
        const SNOTICE = 0x04;   // +s
        const OPER = 0x08;      // +o
    }
}

/// A connected client.
#[derive(Debug)]
pub struct Client {
    pub id: ConnId,
    /// Remote host, as shown in the client's mask.
    pub host: String,
    pub nick: Option<String>,
    pub user: Option<String>,
    pub realname: Option<String>,
    pub context: ConnContext,
    pub modes: UserModes,
    /// Casemapped names of joined channels.
    pub channels: OrderedMap<String, ()>,
    sender: mpsc::UnboundedSender<Message>,
}

impl Client {
    pub fn new(id: ConnId, host: String, sender: mpsc::UnboundedSender<Message>) -> Self {
        Self {
            id,
            host,
            nick: None,
            user: None,
            realname: None,
            context: ConnContext::Unregistered,
            modes: UserModes::empty(),
            channels: OrderedMap::new(),
            sender,
        }
    }

    /// Nick for use in replies, `*` before one is set.
    pub fn nick_or_star(&self) -> &str {
        self.nick.as_deref().unwrap_or("*")
    }

    /// `nick!user@host`.
    pub fn mask(&self) -> String {
        format!(
            "{}!{}@{}",
            self.nick_or_star(),
            self.user.as_deref().unwrap_or("*"),
            self.host
        )
    }

    #[inline]
    pub fn is_registered(&self) -> bool {
        self.context == ConnContext::User
    }

    #[inline]
    pub fn is_oper(&self) -> bool {
        self.modes.contains(UserModes::OPER)
    }

    /// Queue a message for this client's connection.
    pub fn send(&self, msg: Message) {
        if self.sender.send(msg).is_err() {
            debug!(conn = %self.id, "dropping message for closed connection");
        }
    }
}
