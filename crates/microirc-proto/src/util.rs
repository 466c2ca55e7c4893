//! Mask matching.

use crate::casemap::irc_lower_char;

/// Match `text` against a glob `pattern` under RFC 1459 case mapping.
///
/// `*` matches any run of characters, `?` exactly one.
///
/// # Examples
///
/// ```
/// use microirc_proto::wildcard_match;
///
/// assert!(wildcard_match("*!*@*.example.org", "alice!al@host.EXAMPLE.org"));
/// assert!(wildcard_match("b?b!*@*", "BOB!u@h"));
/// assert!(!wildcard_match("*!admin@*", "nick!user@host"));
/// ```
pub fn wildcard_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().map(irc_lower_char).collect();
    let text: Vec<char> = text.chars().map(irc_lower_char).collect();

    let (mut p, mut t) = (0, 0);
    // Position just after the last '*' seen, and where in the text it matched.
    let mut star: Option<(usize, usize)> = None;

    while t < text.len() {
        if p < pattern.len() && (pattern[p] == '?' || pattern[p] == text[t]) {
            p += 1;
            t += 1;
        } else if p < pattern.len() && pattern[p] == '*' {
            star = Some((p + 1, t));
            p += 1;
        } else if let Some((sp, st)) = star {
            p = sp;
            t = st + 1;
            star = Some((sp, st + 1));
        } else {
            return false;
        }
    }

    pattern[p..].iter().all(|&c| c == '*')
}
