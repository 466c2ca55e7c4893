//! Mode-string tokenizing and formatting.
//!
//! A mode string such as `+ov-b` is a run of mode characters, each governed by
//! the most recent `+` or `-`. A character that appears before any sign is
//! treated as `+`.

use std::fmt;

/// Whether a mode is being set or unset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ModeSign {
    /// `+`
    #[default]
    Plus,
    /// `-`
    Minus,
}

impl ModeSign {
    /// True for [`ModeSign::Plus`].
    #[inline]
    pub fn is_set(self) -> bool {
        self == ModeSign::Plus
    }

    /// The wire character for this sign.
    #[inline]
    pub fn as_char(self) -> char {
        match self {
            ModeSign::Plus => '+',
            ModeSign::Minus => '-',
        }
    }
}

impl fmt::Display for ModeSign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Iterator over `(sign, mode char)` pairs of a mode string.
///
/// ```
/// use microirc_proto::{ModeSign, ModeTokens};
///
/// let tokens: Vec<_> = ModeTokens::new("o+v-bb").collect();
/// assert_eq!(
///     tokens,
///     [
///         (ModeSign::Plus, 'o'),
///         (ModeSign::Plus, 'v'),
///         (ModeSign::Minus, 'b'),
///         (ModeSign::Minus, 'b'),
///     ]
/// );
/// ```
#[derive(Clone, Debug)]
pub struct ModeTokens<'a> {
    chars: std::str::Chars<'a>,
    sign: ModeSign,
}

impl<'a> ModeTokens<'a> {
    /// Tokenize `modes`.
    pub fn new(modes: &'a str) -> Self {
        ModeTokens {
            chars: modes.chars(),
            sign: ModeSign::Plus,
        }
    }
}

impl Iterator for ModeTokens<'_> {
    type Item = (ModeSign, char);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.chars.next()? {
                '+' => self.sign = ModeSign::Plus,
                '-' => self.sign = ModeSign::Minus,
                c => return Some((self.sign, c)),
            }
        }
    }
}

/// One applied mode change.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModeChange {
    /// Set or unset.
    pub sign: ModeSign,
    /// Mode character.
    pub mode: char,
    /// Argument echoed with the change, if any.
    pub arg: Option<String>,
}

impl ModeChange {
    /// A change with no argument.
    pub fn new(sign: ModeSign, mode: char) -> Self {
        ModeChange {
            sign,
            mode,
            arg: None,
        }
    }

    /// A change carrying an argument.
    pub fn with_arg(sign: ModeSign, mode: char, arg: impl Into<String>) -> Self {
        ModeChange {
            sign,
            mode,
            arg: Some(arg.into()),
        }
    }

    /// Render changes as MODE parameters: a compact mode string followed by
    /// the arguments in order.
    ///
    /// Returns an empty vector when there are no changes.
    ///
    /// ```
    /// use microirc_proto::{ModeChange, ModeSign};
    ///
    /// let params = ModeChange::to_params(&[
    ///     ModeChange::new(ModeSign::Plus, 'm'),
    ///     ModeChange::with_arg(ModeSign::Plus, 'o', "alice"),
    ///     ModeChange::with_arg(ModeSign::Minus, 'v', "bob"),
    /// ]);
    /// assert_eq!(params, ["+mo-v", "alice", "bob"]);
    /// ```
    pub fn to_params(changes: &[ModeChange]) -> Vec<String> {
        if changes.is_empty() {
            return Vec::new();
        }

        let mut modes = String::with_capacity(changes.len() * 2);
        let mut args = Vec::new();
        let mut current = None;

        for change in changes {
            if current != Some(change.sign) {
                modes.push(change.sign.as_char());
                current = Some(change.sign);
            }
            modes.push(change.mode);
            if let Some(arg) = &change.arg {
                args.push(arg.clone());
            }
        }

        let mut params = Vec::with_capacity(args.len() + 1);
        params.push(modes);
        params.extend(args);
        params
    }
}
