//! The server-wide state container.

use chrono::{DateTime, Utc};
use microirc_proto::{irc_to_lower, Message, Response};
use tokio::sync::mpsc;
use tracing::debug;

use super::{Channel, Client, ConnId, MemberModes, OrderedMap};
use crate::config::{Config, LimitsConfig};

/// Static server identity.
#[derive(Debug, Clone)]
pub struct ServerInfo {
    pub name: String,
    pub network: String,
    pub version: String,
    pub created: DateTime<Utc>,
    pub limits: LimitsConfig,
}

impl ServerInfo {
    pub fn from_config(config: &Config) -> Self {
        Self {
            name: config.server.name.clone(),
            network: config.server.network.clone(),
            version: format!("microircd-{}", env!("CARGO_PKG_VERSION")),
            created: Utc::now(),
            limits: config.limits.clone(),
        }
    }
}

/// Clients, the nick directory and channels.
///
/// Directory keys are casemapped with [`irc_to_lower`].
pub struct ServerState {
    pub info: ServerInfo,
    pub clients: OrderedMap<ConnId, Client>,
    pub nicks: OrderedMap<String, ConnId>,
    pub channels: OrderedMap<String, Channel>,
    next_id: u64,
}

impl ServerState {
    pub fn new(info: ServerInfo) -> Self {
        Self {
            info,
            clients: OrderedMap::new(),
            nicks: OrderedMap::new(),
            channels: OrderedMap::new(),
            next_id: 1,
        }
    }

    /// Track a new connection.
    pub fn add_client(&mut self, host: String, sender: mpsc::UnboundedSender<Message>) -> ConnId {
        let id = ConnId(self.next_id);
        self.next_id += 1;
        self.clients.insert(id, Client::new(id, host, sender));
        id
    }

    pub fn send(&self, id: ConnId, msg: Message) {
        if let Some(client) = self.clients.get(&id) {
            client.send(msg);
        }
    }

    /// Send a numeric reply to `id`, addressed to its nick (or `*`).
    pub fn reply<I, P>(&self, id: ConnId, response: Response, params: I)
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        if let Some(client) = self.clients.get(&id) {
            client.send(Message::numeric(
                &self.info.name,
                response,
                client.nick_or_star(),
                params,
            ));
        }
    }

    pub fn nick_or_star(&self, id: ConnId) -> String {
        self.clients
            .get(&id)
            .map(|c| c.nick_or_star().to_string())
            .unwrap_or_else(|| "*".to_string())
    }

    pub fn find_nick(&self, nick: &str) -> Option<ConnId> {
        self.nicks.get(&irc_to_lower(nick)).copied()
    }

    /// Give `id` a new nick, returning the old one.
    pub fn set_nick(&mut self, id: ConnId, nick: &str) -> Option<String> {
        let client = self.clients.get_mut(&id)?;
        let old = client.nick.replace(nick.to_string());
        if let Some(old) = &old {
            self.nicks.remove(&irc_to_lower(old));
        }
        self.nicks.insert(irc_to_lower(nick), id);
        old
    }

    /// Send `msg` to every member of the channel, optionally skipping one.
    pub fn broadcast(&self, chan_key: &str, msg: &Message, except: Option<ConnId>) {
        let Some(channel) = self.channels.get(chan_key) else {
            return;
        };
        for member in channel.members.keys() {
            if Some(*member) != except {
                self.send(*member, msg.clone());
            }
        }
    }

    /// Everyone sharing at least one channel with `id`, excluding `id`.
    pub fn peers_of(&self, id: ConnId) -> OrderedMap<ConnId, ()> {
        let mut peers = OrderedMap::new();
        let Some(client) = self.clients.get(&id) else {
            return peers;
        };
        for chan_key in client.channels.keys() {
            if let Some(channel) = self.channels.get(chan_key) {
                for member in channel.members.keys() {
                    if *member != id {
                        peers.insert(*member, ());
                    }
                }
            }
        }
        peers
    }

    /// Add `id` to a channel, creating it if needed. The creator gets +o.
    ///
    /// Returns true if the channel was created.
    pub fn add_member(&mut self, id: ConnId, chan_key: &str, name: &str) -> bool {
        let created = !self.channels.contains_key(chan_key);
        if created {
            debug!(channel = %name, "creating channel");
            self.channels.insert(chan_key.to_string(), Channel::new(name));
        }
        if let Some(channel) = self.channels.get_mut(chan_key) {
            let status = if created {
                MemberModes::OP
            } else {
                MemberModes::empty()
            };
            channel.members.insert(id, status);
        }
        if let Some(client) = self.clients.get_mut(&id) {
            client.channels.insert(chan_key.to_string(), ());
        }
        created
    }

    /// Remove `id` from a channel, destroying it once empty unless +P.
    ///
    /// Returns false if `id` was not a member.
    pub fn remove_member(&mut self, id: ConnId, chan_key: &str) -> bool {
        let Some(channel) = self.channels.get_mut(chan_key) else {
            return false;
        };
        if channel.members.remove(&id).is_none() {
            return false;
        }
        if channel.members.is_empty() && !channel.is_permanent() {
            debug!(channel = %channel.name, "destroying empty channel");
            self.channels.remove(chan_key);
        }
        if let Some(client) = self.clients.get_mut(&id) {
            client.channels.remove(chan_key);
        }
        true
    }

    /// Drop a client, telling its peers it quit.
    pub fn remove_client(&mut self, id: ConnId, reason: &str) -> Option<Client> {
        if self.clients.get(&id)?.is_registered() {
            let quit = self.clients.get(&id).map(|c| {
                Message::new("QUIT", [reason]).with_source(c.mask())
            });
            if let Some(quit) = quit {
                for peer in self.peers_of(id).keys() {
                    self.send(*peer, quit.clone());
                }
            }
        }

        let client = self.clients.remove(&id)?;
        let joined = &client.channels;
        self.channels.each(|cursor| {
            if !joined.contains_key(cursor.key()) {
                return;
            }
            let Some(channel) = cursor.value_mut() else {
                return;
            };
            channel.members.remove(&id);
            if channel.members.is_empty() && !channel.is_permanent() {
                debug!(channel = %channel.name, "destroying empty channel");
                cursor.remove();
            }
        });

        if let Some(nick) = &client.nick {
            self.nicks.remove(&irc_to_lower(nick));
        }
        debug!(conn = %id, clients = self.clients.len(), "client removed");
        Some(client)
    }
}
