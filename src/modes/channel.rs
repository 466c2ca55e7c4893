//! Channel mode table.

use microirc_proto::ModeSign;

use super::engine::{ModeEngine, ModeErrors, ModeFlags, ModeInfo, ModeKind, ModeTarget, ParamPolicy};
use crate::state::{Channel, ChannelModes, ConnId, ListEntry, MemberModes, OrderedMap};

impl ModeTarget for Channel {
    /// The nick directory.
    type Env = OrderedMap<String, ConnId>;
    type Member = ConnId;

    fn flag_bits(&self) -> u32 {
        self.modes.bits()
    }

    fn set_flag_bits(&mut self, bits: u32) {
        self.modes.insert(ChannelModes::from_bits_truncate(bits));
    }

    fn reset_flag_bits(&mut self, bits: u32) {
        self.modes.remove(ChannelModes::from_bits_truncate(bits));
    }

    fn status_target(&self, nicks: &Self::Env, name: &str) -> Option<ConnId> {
        let id = *nicks.get(&microirc_proto::irc_to_lower(name))?;
        self.is_member(id).then_some(id)
    }

    fn status_bits(&self, member: &ConnId) -> u32 {
        self.members.get(member).map_or(0, |m| m.bits())
    }

    fn set_status_bits(&mut self, member: &ConnId, bits: u32) {
        if let Some(modes) = self.members.get_mut(member) {
            modes.insert(MemberModes::from_bits_truncate(bits));
        }
    }

    fn reset_status_bits(&mut self, member: &ConnId, bits: u32) {
        if let Some(modes) = self.members.get_mut(member) {
            modes.remove(MemberModes::from_bits_truncate(bits));
        }
    }

    fn list(&mut self, mode: char) -> Option<&mut OrderedMap<String, ListEntry>> {
        match mode {
            'b' => Some(&mut self.bans),
            'e' => Some(&mut self.excepts),
            'I' => Some(&mut self.invex),
            _ => None,
        }
    }
}

fn key_mode(engine: &mut ModeEngine<'_, Channel>, sign: ModeSign, param: Option<&str>) {
    match sign {
        ModeSign::Plus => {
            let Some(key) = param.filter(|k| !k.is_empty()) else {
                engine.fail(ModeErrors::MISSING_PARAM);
                return;
            };
            if engine.target.key.as_deref() == Some(key) {
                return;
            }
            engine.target.key = Some(key.to_string());
            engine.record(sign, 'k', Some(key.to_string()));
        }
        ModeSign::Minus => {
            if engine.target.key.take().is_some() {
                engine.record(sign, 'k', Some("*".to_string()));
            }
        }
    }
}

fn limit_mode(engine: &mut ModeEngine<'_, Channel>, sign: ModeSign, param: Option<&str>) {
    match sign {
        ModeSign::Plus => {
            let Some(param) = param else {
                engine.fail(ModeErrors::MISSING_PARAM);
                return;
            };
            let Some(limit) = param.parse::<usize>().ok().filter(|l| *l > 0) else {
                return;
            };
            if engine.target.limit == Some(limit) {
                return;
            }
            engine.target.limit = Some(limit);
            engine.record(sign, 'l', Some(limit.to_string()));
        }
        ModeSign::Minus => {
            if engine.target.limit.take().is_some() {
                engine.record(sign, 'l', None);
            }
        }
    }
}

pub static CHANNEL_MODES: &[ModeInfo<Channel>] = &[
    ModeInfo::flag('i', ChannelModes::INVITE_ONLY.bits()),
    ModeInfo::flag('m', ChannelModes::MODERATED.bits()),
    ModeInfo::flag('n', ChannelModes::NO_EXTERNAL.bits()),
    ModeInfo::flag('p', ChannelModes::PRIVATE.bits()),
    ModeInfo::flag('s', ChannelModes::SECRET.bits()),
    ModeInfo::flag('t', ChannelModes::TOPIC_LOCK.bits()),
    ModeInfo {
        ch: 'P',
        flags: ModeFlags::OPER_ONLY,
        kind: ModeKind::Flag(ChannelModes::PERMANENT.bits()),
    },
    ModeInfo::status('o', MemberModes::OP.bits(), '@'),
    ModeInfo::status('v', MemberModes::VOICE.bits(), '+'),
    ModeInfo::list('b'),
    ModeInfo::list('e'),
    ModeInfo::list('I'),
    ModeInfo::external('k', key_mode, ParamPolicy::Always),
    ModeInfo::external('l', limit_mode, ParamPolicy::OnSet),
];

/// Letters grouped the way the CHANMODES token wants them:
/// lists, always-param, set-only-param, flags.
pub fn chanmodes_isupport() -> String {
    let mut groups: [String; 4] = Default::default();
    for info in CHANNEL_MODES {
        let group = match &info.kind {
            ModeKind::List => 0,
            ModeKind::External { param, .. } => match param {
                ParamPolicy::Always => 1,
                ParamPolicy::OnSet => 2,
                ParamPolicy::Never => 3,
            },
            ModeKind::Flag(_) => 3,
            ModeKind::Status { .. } => continue,
        };
        groups[group].push(info.ch);
    }
    groups.join(",")
}

/// The PREFIX token, e.g. `(ov)@+`.
pub fn prefix_isupport() -> String {
    let (modes, prefixes): (String, String) = CHANNEL_MODES
        .iter()
        .filter_map(|info| match info.kind {
            ModeKind::Status { prefix, .. } => Some((info.ch, prefix)),
            _ => None,
        })
        .unzip();
    format!("({modes}){prefixes}")
}

/// Every channel mode letter, for RPL_MYINFO.
pub fn channel_mode_letters() -> String {
    CHANNEL_MODES.iter().map(|info| info.ch).collect()
}

/// Current modes as RPL_CHANNELMODEIS parameters.
///
/// The key is only shown to members.
pub fn channel_mode_params(channel: &Channel, show_key: bool) -> Vec<String> {
    let mut modes = String::from("+");
    let mut args = Vec::new();
    for info in CHANNEL_MODES {
        if let ModeKind::Flag(bit) = info.kind {
            if channel.modes.bits() & bit != 0 {
                modes.push(info.ch);
            }
        }
    }
    if let Some(key) = &channel.key {
        modes.push('k');
        args.push(if show_key { key.clone() } else { "*".to_string() });
    }
    if let Some(limit) = channel.limit {
        modes.push('l');
        args.push(limit.to_string());
    }
    let mut params = vec![modes];
    params.extend(args);
    params
}
