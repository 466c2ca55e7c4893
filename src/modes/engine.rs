//! Table-driven mode application.
//!
//! A mode table is a static slice of [`ModeInfo`] describing every mode
//! character a target understands. [`ModeEngine::process`] walks a mode
//! string against that table, consuming parameters in step, and returns a
//! [`ModeOutcome`] with the effective changes and an error bitmask. Errors
//! never abort the walk: a rejected character is recorded and the next one
//! is processed.

use bitflags::bitflags;
use microirc_proto::{irc_to_lower, ModeChange, ModeSign, ModeTokens};
use tracing::trace;

use crate::state::{ListEntry, OrderedMap};

bitflags! {
    /// Per-mode restrictions.
    pub struct ModeFlags: u32 {
        /// Only server operators may change it.
        const OPER_ONLY = 0x01;
        /// May be cleared but never set through MODE.
        const UNSET_ONLY = 0x02;
    }
}

bitflags! {
    /// Accumulated failures from one mode string.
    #[derive(Default)]
    pub struct ModeErrors: u32 {
        const UNKNOWN_CHAR = 0x01;
        const NO_ACCESS = 0x02;
        const NOT_OPER = 0x04;
        const SET_UNSET_ONLY = 0x08;
        const MISSING_PARAM = 0x10;
        const LIST_FULL = 0x20;
    }
}

/// When an external mode takes a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamPolicy {
    #[cfg_attr(not(test), allow(dead_code))]
    Never,
    OnSet,
    Always,
}

/// Handler for an external mode. Receives the sign and the consumed
/// parameter, if any.
pub type ExternalFn<T> = fn(&mut ModeEngine<'_, T>, ModeSign, Option<&str>);

pub enum ModeKind<T: ModeTarget + 'static> {
    /// A bit in the target's flag word.
    Flag(u32),
    /// A bit in a member's status word; the parameter names the member.
    Status { bit: u32, prefix: char },
    /// A mask list. No parameter means "show the list".
    List,
    External {
        handler: ExternalFn<T>,
        param: ParamPolicy,
    },
}

/// One row of a mode table.
pub struct ModeInfo<T: ModeTarget + 'static> {
    pub ch: char,
    pub flags: ModeFlags,
    pub kind: ModeKind<T>,
}

impl<T: ModeTarget + 'static> ModeInfo<T> {
    pub const fn flag(ch: char, bit: u32) -> Self {
        Self {
            ch,
            flags: ModeFlags::empty(),
            kind: ModeKind::Flag(bit),
        }
    }

    pub const fn status(ch: char, bit: u32, prefix: char) -> Self {
        Self {
            ch,
            flags: ModeFlags::empty(),
            kind: ModeKind::Status { bit, prefix },
        }
    }

    pub const fn list(ch: char) -> Self {
        Self {
            ch,
            flags: ModeFlags::empty(),
            kind: ModeKind::List,
        }
    }

    pub const fn external(ch: char, handler: ExternalFn<T>, param: ParamPolicy) -> Self {
        Self {
            ch,
            flags: ModeFlags::empty(),
            kind: ModeKind::External { handler, param },
        }
    }

    /// Whether this mode consumes a parameter for the given sign.
    ///
    /// List modes consume one only if one is left.
    pub fn takes_param(&self, sign: ModeSign) -> bool {
        match &self.kind {
            ModeKind::Flag(_) => false,
            ModeKind::Status { .. } | ModeKind::List => true,
            ModeKind::External { param, .. } => match param {
                ParamPolicy::Never => false,
                ParamPolicy::OnSet => sign.is_set(),
                ParamPolicy::Always => true,
            },
        }
    }
}

/// Something modes can be applied to.
///
/// Flag storage is required. Status and list storage default to "none",
/// which suits targets without members or lists.
pub trait ModeTarget {
    /// Lookup context for resolving status targets.
    type Env: ?Sized;
    /// Handle to a member whose status can change.
    type Member;

    fn flag_bits(&self) -> u32;
    fn set_flag_bits(&mut self, bits: u32);
    fn reset_flag_bits(&mut self, bits: u32);

    fn status_target(&self, _env: &Self::Env, _name: &str) -> Option<Self::Member> {
        None
    }

    fn status_bits(&self, _member: &Self::Member) -> u32 {
        0
    }

    fn set_status_bits(&mut self, _member: &Self::Member, _bits: u32) {}

    fn reset_status_bits(&mut self, _member: &Self::Member, _bits: u32) {}

    fn list(&mut self, _mode: char) -> Option<&mut OrderedMap<String, ListEntry>> {
        None
    }
}

/// Who is changing modes.
#[derive(Debug, Clone)]
pub struct Actor {
    pub nick: String,
    /// `nick!user@host`, recorded as the setter of list entries.
    pub mask: String,
    pub is_oper: bool,
}

/// What the actor may do on this target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Granted,
    /// Only list queries are allowed.
    QueryOnly,
}

/// Result of [`ModeEngine::process`].
#[derive(Debug, Default)]
pub struct ModeOutcome {
    pub errors: ModeErrors,
    /// Unknown mode characters, each once, in order of appearance.
    pub unknown: String,
    /// Changes that actually altered state.
    pub changes: Vec<ModeChange>,
    /// List modes queried without a parameter, each once.
    pub list_queries: Vec<char>,
    /// Status parameters that did not name a member.
    pub unresolved: Vec<String>,
    /// Modes that needed a parameter and got none.
    pub missing_params: usize,
}

pub struct ModeEngine<'a, T: ModeTarget + 'static> {
    table: &'a [ModeInfo<T>],
    pub actor: &'a Actor,
    pub target: &'a mut T,
    pub env: &'a T::Env,
    pub access: Access,
    list_limit: usize,
    outcome: ModeOutcome,
}

impl<'a, T: ModeTarget + 'static> ModeEngine<'a, T> {
    pub fn new(
        table: &'a [ModeInfo<T>],
        actor: &'a Actor,
        target: &'a mut T,
        env: &'a T::Env,
        access: Access,
    ) -> Self {
        Self {
            table,
            actor,
            target,
            env,
            access,
            list_limit: usize::MAX,
            outcome: ModeOutcome::default(),
        }
    }

    /// Cap the size of each list mode.
    #[must_use]
    pub fn with_list_limit(mut self, limit: usize) -> Self {
        self.list_limit = limit;
        self
    }

    /// Record an effective change.
    pub fn record(&mut self, sign: ModeSign, mode: char, arg: Option<String>) {
        self.outcome.changes.push(ModeChange { sign, mode, arg });
    }

    /// Flag an error without stopping.
    ///
    /// MISSING_PARAM reported here counts as a mode left without a
    /// parameter.
    pub fn fail(&mut self, error: ModeErrors) {
        if error.contains(ModeErrors::MISSING_PARAM) {
            self.outcome.missing_params += 1;
        }
        self.outcome.errors |= error;
    }

    /// Apply `modes` with `params` in order.
    ///
    /// Parameters are consumed left to right by the characters that take
    /// one, whether or not the change is then allowed. Unknown characters
    /// consume nothing.
    pub fn process(mut self, modes: &str, params: &[&str]) -> ModeOutcome {
        let table = self.table;
        let mut params = params.iter().copied();

        for (sign, ch) in ModeTokens::new(modes) {
            let Some(info) = table.iter().find(|m| m.ch == ch) else {
                self.fail(ModeErrors::UNKNOWN_CHAR);
                if !self.outcome.unknown.contains(ch) {
                    self.outcome.unknown.push(ch);
                }
                continue;
            };

            let param = if info.takes_param(sign) {
                params.next()
            } else {
                None
            };
            // An empty mask is consumed but lists nothing.
            let param = match info.kind {
                ModeKind::List => param.filter(|p| !p.is_empty()),
                _ => param,
            };

            if info.flags.contains(ModeFlags::OPER_ONLY) && !self.actor.is_oper {
                self.fail(ModeErrors::NOT_OPER);
                continue;
            }
            if info.flags.contains(ModeFlags::UNSET_ONLY) && sign.is_set() {
                self.fail(ModeErrors::SET_UNSET_ONLY);
                continue;
            }
            let is_query = matches!(info.kind, ModeKind::List) && param.is_none();
            if self.access == Access::QueryOnly && !is_query {
                self.fail(ModeErrors::NO_ACCESS);
                continue;
            }

            match &info.kind {
                ModeKind::Flag(bit) => self.apply_flag(sign, ch, *bit),
                ModeKind::Status { bit, .. } => self.apply_status(sign, ch, *bit, param),
                ModeKind::List => self.apply_list(sign, ch, param),
                ModeKind::External { handler, .. } => handler(&mut self, sign, param),
            }
        }

        trace!(
            modes,
            changes = self.outcome.changes.len(),
            errors = ?self.outcome.errors,
            "mode string processed"
        );
        self.outcome
    }

    fn apply_flag(&mut self, sign: ModeSign, ch: char, bit: u32) {
        let current = self.target.flag_bits() & bit != 0;
        match sign {
            ModeSign::Plus if !current => self.target.set_flag_bits(bit),
            ModeSign::Minus if current => self.target.reset_flag_bits(bit),
            _ => return,
        }
        self.record(sign, ch, None);
    }

    fn apply_status(&mut self, sign: ModeSign, ch: char, bit: u32, param: Option<&str>) {
        let Some(name) = param else {
            self.fail(ModeErrors::MISSING_PARAM);
            return;
        };
        let Some(member) = self.target.status_target(self.env, name) else {
            self.outcome.errors |= ModeErrors::MISSING_PARAM;
            self.outcome.unresolved.push(name.to_string());
            return;
        };

        let current = self.target.status_bits(&member) & bit != 0;
        match sign {
            ModeSign::Plus if !current => self.target.set_status_bits(&member, bit),
            ModeSign::Minus if current => self.target.reset_status_bits(&member, bit),
            _ => return,
        }
        self.record(sign, ch, Some(name.to_string()));
    }

    fn apply_list(&mut self, sign: ModeSign, ch: char, param: Option<&str>) {
        let Some(raw) = param else {
            if !self.outcome.list_queries.contains(&ch) {
                self.outcome.list_queries.push(ch);
            }
            return;
        };

        let mask = normalize_mask(raw);
        let key = irc_to_lower(&mask);
        let limit = self.list_limit;
        let set_by = self.actor.mask.clone();

        let Some(list) = self.target.list(ch) else {
            trace!(mode = %ch, "list mode has no backing list");
            return;
        };

        let changed = if sign.is_set() {
            if list.contains_key(&key) {
                None
            } else if list.len() >= limit {
                self.outcome.errors |= ModeErrors::LIST_FULL;
                None
            } else {
                list.insert(
                    key,
                    ListEntry {
                        mask: mask.clone(),
                        set_by,
                        set_at: chrono::Utc::now().timestamp(),
                    },
                );
                Some(mask)
            }
        } else {
            list.remove(&key).map(|entry| entry.mask)
        };

        if let Some(mask) = changed {
            self.record(sign, ch, Some(mask));
        }
    }
}

/// Expand a partial mask to `nick!user@host` form.
pub fn normalize_mask(mask: &str) -> String {
    match (mask.contains('!'), mask.contains('@')) {
        (true, true) => mask.to_string(),
        (true, false) => format!("{mask}@*"),
        (false, true) => format!("*!{mask}"),
        (false, false) => format!("{mask}!*@*"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const M: u32 = 0x01;
    const S: u32 = 0x02;
    const OP: u32 = 0x01;

    #[derive(Default)]
    struct Room {
        flags: u32,
        members: OrderedMap<String, u32>,
        bans: OrderedMap<String, ListEntry>,
        key: Option<String>,
        registered: bool,
    }

    impl ModeTarget for Room {
        type Env = ();
        type Member = String;

        fn flag_bits(&self) -> u32 {
            self.flags
        }
        fn set_flag_bits(&mut self, bits: u32) {
            self.flags |= bits;
        }
        fn reset_flag_bits(&mut self, bits: u32) {
            self.flags &= !bits;
        }
        fn status_target(&self, _env: &(), name: &str) -> Option<String> {
            self.members.contains_key(name).then(|| name.to_string())
        }
        fn status_bits(&self, member: &String) -> u32 {
            self.members.get(member).copied().unwrap_or(0)
        }
        fn set_status_bits(&mut self, member: &String, bits: u32) {
            if let Some(b) = self.members.get_mut(member) {
                *b |= bits;
            }
        }
        fn reset_status_bits(&mut self, member: &String, bits: u32) {
            if let Some(b) = self.members.get_mut(member) {
                *b &= !bits;
            }
        }
        fn list(&mut self, mode: char) -> Option<&mut OrderedMap<String, ListEntry>> {
            match mode {
                'b' => Some(&mut self.bans),
                _ => None,
            }
        }
    }

    fn room_key(engine: &mut ModeEngine<'_, Room>, sign: ModeSign, param: Option<&str>) {
        match (sign, param) {
            (ModeSign::Plus, Some(key)) => {
                engine.target.key = Some(key.to_string());
                engine.record(sign, 'k', Some(key.to_string()));
            }
            (ModeSign::Plus, None) => engine.fail(ModeErrors::MISSING_PARAM),
            (ModeSign::Minus, _) => {
                if engine.target.key.take().is_some() {
                    engine.record(sign, 'k', Some("*".to_string()));
                }
            }
        }
    }

    fn room_registered(engine: &mut ModeEngine<'_, Room>, sign: ModeSign, param: Option<&str>) {
        assert!(param.is_none());
        if engine.target.registered != sign.is_set() {
            engine.target.registered = sign.is_set();
            engine.record(sign, 'r', None);
        }
    }

    static ROOM_MODES: &[ModeInfo<Room>] = &[
        ModeInfo::flag('m', M),
        ModeInfo {
            ch: 'S',
            flags: ModeFlags::OPER_ONLY,
            kind: ModeKind::Flag(S),
        },
        ModeInfo::status('o', OP, '@'),
        ModeInfo::list('b'),
        ModeInfo::external('k', room_key, ParamPolicy::Always),
        ModeInfo::external('r', room_registered, ParamPolicy::Never),
    ];

    fn actor(is_oper: bool) -> Actor {
        Actor {
            nick: "alice".to_string(),
            mask: "alice!a@host".to_string(),
            is_oper,
        }
    }

    fn room() -> Room {
        let mut room = Room::default();
        room.members.insert("alice".to_string(), OP);
        room.members.insert("bob".to_string(), 0);
        room
    }

    fn run(room: &mut Room, access: Access, oper: bool, modes: &str, params: &[&str]) -> ModeOutcome {
        let actor = actor(oper);
        ModeEngine::new(ROOM_MODES, &actor, room, &(), access)
            .with_list_limit(2)
            .process(modes, params)
    }

    #[test]
    fn test_flag_set_and_unset() {
        let mut room = room();
        let out = run(&mut room, Access::Granted, false, "+m", &[]);
        assert!(out.errors.is_empty());
        assert_eq!(room.flags & M, M);
        assert_eq!(ModeChange::to_params(&out.changes), ["+m"]);

        // Setting again changes nothing.
        let out = run(&mut room, Access::Granted, false, "+m", &[]);
        assert!(out.changes.is_empty());

        let out = run(&mut room, Access::Granted, false, "-m", &[]);
        assert_eq!(room.flags & M, 0);
        assert_eq!(ModeChange::to_params(&out.changes), ["-m"]);
    }

    #[test]
    fn test_status_mode_resolves_member() {
        let mut room = room();
        let out = run(&mut room, Access::Granted, false, "+o", &["bob"]);
        assert!(out.errors.is_empty());
        assert_eq!(room.members.get("bob"), Some(&OP));
        assert_eq!(ModeChange::to_params(&out.changes), ["+o", "bob"]);
    }

    #[test]
    fn test_status_mode_without_param() {
        let mut room = room();
        let out = run(&mut room, Access::Granted, false, "+o", &[]);
        assert_eq!(out.errors, ModeErrors::MISSING_PARAM);
        assert_eq!(out.missing_params, 1);
        assert!(out.unresolved.is_empty());
        assert!(out.changes.is_empty());
        assert_eq!(room.members.get("alice"), Some(&OP));
        assert_eq!(room.members.get("bob"), Some(&0));
    }

    #[test]
    fn test_unresolved_and_missing_are_counted_apart() {
        let mut room = room();
        let out = run(&mut room, Access::Granted, false, "+oo", &["carol"]);
        assert_eq!(out.errors, ModeErrors::MISSING_PARAM);
        assert_eq!(out.unresolved, ["carol"]);
        assert_eq!(out.missing_params, 1);
    }

    #[test]
    fn test_status_mode_unknown_member() {
        let mut room = room();
        let out = run(&mut room, Access::Granted, false, "+o", &["carol"]);
        assert!(out.errors.contains(ModeErrors::MISSING_PARAM));
        assert_eq!(out.unresolved, ["carol"]);
        assert_eq!(out.missing_params, 0);
    }

    #[test]
    fn test_unknown_char_consumes_nothing() {
        let mut room = room();
        let out = run(&mut room, Access::Granted, false, "+zoz", &["bob"]);
        assert_eq!(out.errors, ModeErrors::UNKNOWN_CHAR);
        assert_eq!(out.unknown, "z");
        assert_eq!(room.members.get("bob"), Some(&OP));
    }

    #[test]
    fn test_oper_only_is_best_effort() {
        let mut room = room();
        let out = run(&mut room, Access::Granted, false, "+Sm", &[]);
        assert_eq!(out.errors, ModeErrors::NOT_OPER);
        assert_eq!(room.flags, M);
        assert_eq!(ModeChange::to_params(&out.changes), ["+m"]);

        let out = run(&mut room, Access::Granted, true, "+S", &[]);
        assert!(out.errors.is_empty());
        assert_eq!(room.flags, M | S);
    }

    #[test]
    fn test_query_only_access() {
        let mut room = room();
        let out = run(&mut room, Access::QueryOnly, false, "+mb", &[]);
        assert_eq!(out.errors, ModeErrors::NO_ACCESS);
        assert_eq!(room.flags, 0);
        assert_eq!(out.list_queries, ['b']);

        let out = run(&mut room, Access::QueryOnly, false, "+b", &["x!*@*"]);
        assert_eq!(out.errors, ModeErrors::NO_ACCESS);
        assert!(room.bans.is_empty());
    }

    #[test]
    fn test_rejected_mode_still_consumes_param() {
        let mut room = room();
        // +o is denied but still eats "bob", so +b gets the mask.
        let out = run(&mut room, Access::QueryOnly, false, "+ob", &["bob", "evil"]);
        assert_eq!(out.errors, ModeErrors::NO_ACCESS);
        assert!(out.list_queries.is_empty());
        assert_eq!(room.members.get("bob"), Some(&0));
    }

    #[test]
    fn test_list_add_remove_and_full() {
        let mut room = room();
        let out = run(&mut room, Access::Granted, false, "+bb", &["one", "*@two"]);
        assert!(out.errors.is_empty());
        assert_eq!(
            ModeChange::to_params(&out.changes),
            ["+bb", "one!*@*", "*!*@two"]
        );
        let entry = room.bans.get("one!*@*").unwrap();
        assert_eq!(entry.set_by, "alice!a@host");

        let out = run(&mut room, Access::Granted, false, "+b", &["three"]);
        assert_eq!(out.errors, ModeErrors::LIST_FULL);
        assert_eq!(room.bans.len(), 2);

        let out = run(&mut room, Access::Granted, false, "-b", &["ONE!*@*"]);
        assert_eq!(ModeChange::to_params(&out.changes), ["-b", "one!*@*"]);
        assert_eq!(room.bans.len(), 1);
    }

    #[test]
    fn test_empty_list_param_is_a_query() {
        let mut room = room();
        // The empty mask is still consumed, so "bob" reaches +o.
        let out = run(&mut room, Access::Granted, false, "+bo", &["", "bob"]);
        assert!(out.errors.is_empty());
        assert!(room.bans.is_empty());
        assert_eq!(out.list_queries, ['b']);
        assert_eq!(ModeChange::to_params(&out.changes), ["+o", "bob"]);
    }

    #[test]
    fn test_external_mode_policy() {
        let mut room = room();
        let out = run(&mut room, Access::Granted, false, "+k", &[]);
        assert_eq!(out.errors, ModeErrors::MISSING_PARAM);

        let out = run(&mut room, Access::Granted, false, "+km", &["secret"]);
        assert!(out.errors.is_empty());
        assert_eq!(room.key.as_deref(), Some("secret"));
        assert_eq!(ModeChange::to_params(&out.changes), ["+km", "secret"]);

        // -k always consumes its parameter, so "bob" goes to +o.
        let out = run(&mut room, Access::Granted, false, "-km+o", &["whatever", "bob"]);
        assert!(out.errors.is_empty());
        assert!(room.key.is_none());
        assert_eq!(room.flags & M, 0);
        assert_eq!(ModeChange::to_params(&out.changes), ["-km+o", "*", "bob"]);

        // +r takes nothing, so "bob" goes to -o.
        let out = run(&mut room, Access::Granted, false, "+r-o", &["bob"]);
        assert!(out.errors.is_empty());
        assert!(room.registered);
        assert_eq!(ModeChange::to_params(&out.changes), ["+r-o", "bob"]);
    }

    #[test]
    fn test_normalize_mask() {
        assert_eq!(normalize_mask("nick"), "nick!*@*");
        assert_eq!(normalize_mask("nick!user"), "nick!user@*");
        assert_eq!(normalize_mask("*@host"), "*!*@host");
        assert_eq!(normalize_mask("a!b@c"), "a!b@c");
    }
}
