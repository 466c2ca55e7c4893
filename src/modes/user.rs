//! User mode table.

use super::engine::{ModeFlags, ModeInfo, ModeKind, ModeTarget};
use crate::state::{Client, UserModes};

impl ModeTarget for Client {
    type Env = ();
    type Member = ();

    fn flag_bits(&self) -> u32 {
        self.modes.bits()
    }

    fn set_flag_bits(&mut self, bits: u32) {
        self.modes.insert(UserModes::from_bits_truncate(bits));
    }

    fn reset_flag_bits(&mut self, bits: u32) {
        self.modes.remove(UserModes::from_bits_truncate(bits));
    }
}

pub static USER_MODES: &[ModeInfo<Client>] = &[
    ModeInfo::flag('i', UserModes::INVISIBLE.bits()),
    ModeInfo::flag('w', UserModes::WALLOPS.bits()),
    ModeInfo {
        ch: 's',
        flags: ModeFlags::OPER_ONLY,
        kind: ModeKind::Flag(UserModes::SNOTICE.bits()),
    },
    // Granted by OPER, which is not part of this server.
    ModeInfo {
        ch: 'o',
        flags: ModeFlags::UNSET_ONLY,
        kind: ModeKind::Flag(UserModes::OPER.bits()),
    },
];

pub fn user_mode_letters() -> String {
    USER_MODES.iter().map(|info| info.ch).collect()
}

/// Current modes as a `+...` string for RPL_UMODEIS.
pub fn user_mode_string(modes: UserModes) -> String {
    let mut out = String::from("+");
    for info in USER_MODES {
        if let ModeKind::Flag(bit) = info.kind {
            if modes.bits() & bit != 0 {
                out.push(info.ch);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modes::{Access, Actor, ModeEngine, ModeErrors};
    use crate::state::ConnId;
    use microirc_proto::ModeChange;
    use tokio::sync::mpsc;

    fn client() -> Client {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut client = Client::new(ConnId(7), "localhost".to_string(), tx);
        client.nick = Some("alice".to_string());
        client
    }

    fn actor(client: &Client) -> Actor {
        Actor {
            nick: client.nick_or_star().to_string(),
            mask: client.mask(),
            is_oper: client.is_oper(),
        }
    }

    #[test]
    fn test_set_invisible_and_wallops() {
        let mut client = client();
        let actor = actor(&client);
        let out = ModeEngine::new(USER_MODES, &actor, &mut client, &(), Access::Granted)
            .process("+iw", &[]);
        assert!(out.errors.is_empty());
        assert_eq!(ModeChange::to_params(&out.changes), ["+iw"]);
        assert_eq!(user_mode_string(client.modes), "+iw");
    }

    #[test]
    fn test_oper_mode_is_unset_only() {
        let mut client = client();
        let actor = actor(&client);
        let out = ModeEngine::new(USER_MODES, &actor, &mut client, &(), Access::Granted)
            .process("+o", &[]);
        assert_eq!(out.errors, ModeErrors::SET_UNSET_ONLY);
        assert!(!client.is_oper());

        client.modes.insert(UserModes::OPER);
        let actor = Actor { is_oper: true, ..actor };
        let out = ModeEngine::new(USER_MODES, &actor, &mut client, &(), Access::Granted)
            .process("-o", &[]);
        assert!(out.errors.is_empty());
        assert!(!client.is_oper());
    }

    #[test]
    fn test_snotice_needs_oper() {
        let mut client = client();
        let actor = actor(&client);
        let out = ModeEngine::new(USER_MODES, &actor, &mut client, &(), Access::Granted)
            .process("+sx", &[]);
        assert_eq!(out.errors, ModeErrors::NOT_OPER | ModeErrors::UNKNOWN_CHAR);
        assert_eq!(out.unknown, "x");
        assert_eq!(user_mode_letters(), "iwso");
    }
}
