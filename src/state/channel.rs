//! Channel-related types and state.

use bitflags::bitflags;
use microirc_proto::wildcard_match;

use super::{ConnId, OrderedMap};

/// An entry in a list mode (bans, excepts, invex).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListEntry {
    pub mask: String,
    pub set_by: String,
    pub set_at: i64,
}

bitflags! {
    /// Channel flag modes.
    #[derive(Default)]
    pub struct ChannelModes: u32 {
        const INVITE_ONLY = 0x01; // +i
        const MODERATED = 0x02;   // +m
        const NO_EXTERNAL = 0x04; // +n
        const PRIVATE = 0x08;     // +p
        const SECRET = 0x10;      // +s
        const TOPIC_LOCK = 0x20;  // +t
        const PERMANENT = 0x40;   // +P
    }
}

bitflags! {
    /// Membership status modes.
    #[derive(Default)]
    pub struct MemberModes: u32 {
        const OP = 0x01;    // +o (@)
        const VOICE = 0x02; // +v (+)
    }
}

impl MemberModes {
    /// Highest prefix character for this member.
    pub fn prefix_char(&self) -> Option<char> {
        if self.contains(MemberModes::OP) {
            Some('@')
        } else if self.contains(MemberModes::VOICE) {
            Some('+')
        } else {
            None
        }
    }
}

/// A channel and everything the server tracks about it.
#[derive(Debug, Clone)]
pub struct Channel {
    /// Name as first created.
    pub name: String,
    pub created_at: i64,
    pub members: OrderedMap<ConnId, MemberModes>,
    pub modes: ChannelModes,
    pub key: Option<String>,
    pub limit: Option<usize>,
    /// Keyed by casemapped mask.
    pub bans: OrderedMap<String, ListEntry>,
    pub excepts: OrderedMap<String, ListEntry>,
    pub invex: OrderedMap<String, ListEntry>,
}

impl Channel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            created_at: chrono::Utc::now().timestamp(),
            members: OrderedMap::new(),
            modes: ChannelModes::empty(),
            key: None,
            limit: None,
            bans: OrderedMap::new(),
            excepts: OrderedMap::new(),
            invex: OrderedMap::new(),
        }
    }

    pub fn is_member(&self, id: ConnId) -> bool {
        self.members.contains_key(&id)
    }

    pub fn is_op(&self, id: ConnId) -> bool {
        self.members
            .get(&id)
            .is_some_and(|m| m.contains(MemberModes::OP))
    }

    /// May `id` speak here under +m?
    pub fn can_speak(&self, id: ConnId) -> bool {
        !self.modes.contains(ChannelModes::MODERATED)
            || self
                .members
                .get(&id)
                .is_some_and(|m| m.intersects(MemberModes::OP | MemberModes::VOICE))
    }

    /// Banned and not covered by a ban exception.
    pub fn is_banned(&self, mask: &str) -> bool {
        list_matches(&self.bans, mask) && !list_matches(&self.excepts, mask)
    }

    pub fn is_invite_excepted(&self, mask: &str) -> bool {
        list_matches(&self.invex, mask)
    }

    /// A channel with +P outlives its last member.
    pub fn is_permanent(&self) -> bool {
        self.modes.contains(ChannelModes::PERMANENT)
    }
}

fn list_matches(list: &OrderedMap<String, ListEntry>, mask: &str) -> bool {
    list.values().any(|entry| wildcard_match(&entry.mask, mask))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(mask: &str) -> ListEntry {
        ListEntry {
            mask: mask.to_string(),
            set_by: "op".to_string(),
            set_at: 0,
        }
    }

    #[test]
    fn test_ban_and_exception() {
        let mut chan = Channel::new("#rust");
        chan.bans.insert("*!*@*.spam".into(), entry("*!*@*.spam"));
        assert!(chan.is_banned("bob!b@host.spam"));

        chan.excepts.insert("bob!*@*".into(), entry("bob!*@*"));
        assert!(!chan.is_banned("bob!b@host.spam"));
        assert!(chan.is_banned("eve!e@host.spam"));
        assert!(!chan.is_banned("eve!e@host.example"));
    }

    #[test]
    fn test_can_speak_under_moderation() {
        let mut chan = Channel::new("#m");
        chan.members.insert(ConnId(1), MemberModes::empty());
        chan.members.insert(ConnId(2), MemberModes::VOICE);
        assert!(chan.can_speak(ConnId(1)));

        chan.modes.insert(ChannelModes::MODERATED);
        assert!(!chan.can_speak(ConnId(1)));
        assert!(chan.can_speak(ConnId(2)));
        assert!(!chan.can_speak(ConnId(3)));
    }

    #[test]
    fn test_prefix_char() {
        assert_eq!((MemberModes::OP | MemberModes::VOICE).prefix_char(), Some('@'));
        assert_eq!(MemberModes::VOICE.prefix_char(), Some('+'));
        assert_eq!(MemberModes::empty().prefix_char(), None);
    }
}
