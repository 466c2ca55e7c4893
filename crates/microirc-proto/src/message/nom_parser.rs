//! Nom-based line parser.
//!
//! Produces a [`ParsedLine`] borrowing from the input. Whitespace follows the
//! C `isspace` set, so tabs and form feeds separate tokens just like spaces.

use nom::{
    bytes::complete::{take_while, take_while1},
    character::complete::char,
    sequence::preceded,
    IResult,
};
use smallvec::SmallVec;

use super::MAX_PARAMS;
use crate::error::MessageParseError;

#[inline]
pub(crate) const fn is_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\x0b' | '\x0c' | '\r')
}

fn skip_space(input: &str) -> &str {
    let res: IResult<&str, &str> = take_while(is_space)(input);
    match res {
        Ok((rest, _)) => rest,
        Err(_) => input,
    }
}

/// One whitespace-delimited token.
fn token(input: &str) -> IResult<&str, &str> {
    take_while1(|c| !is_space(c))(input)
}

/// The source token after a leading `:` (may be empty).
fn source(input: &str) -> IResult<&str, &str> {
    preceded(char(':'), take_while(|c| !is_space(c)))(input)
}

/// Collect parameters up to [`MAX_PARAMS`].
///
/// A parameter starting with `:` swallows the rest of the line verbatim.
/// Once the cap is reached the remainder is discarded.
fn parse_params(input: &str) -> SmallVec<[&str; MAX_PARAMS]> {
    let mut params: SmallVec<[&str; MAX_PARAMS]> = SmallVec::new();
    let mut rest = skip_space(input);

    while params.len() < MAX_PARAMS && !rest.is_empty() {
        if let Some(trailing) = rest.strip_prefix(':') {
            params.push(trailing);
            break;
        }

        match token(rest) {
            Ok((after, param)) => {
                params.push(param);
                rest = skip_space(after);
            }
            Err(_) => break,
        }
    }

    params
}

/// A parsed line with borrowed string slices.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ParsedLine<'a> {
    /// Source without the leading `:`, if present.
    pub source: Option<&'a str>,
    /// The verb exactly as it appeared on the wire.
    pub verb: &'a str,
    /// Parameters, including trailing.
    pub params: SmallVec<[&'a str; MAX_PARAMS]>,
}

impl<'a> ParsedLine<'a> {
    /// Parse a single line (without its terminator).
    pub fn parse(input: &'a str) -> Result<Self, MessageParseError> {
        let input = skip_space(input);
        if input.is_empty() {
            return Err(MessageParseError::EmptyMessage);
        }

        // A bare `:` yields an empty source; only a missing verb is an error.
        let (input, source) = match source(input) {
            Ok((rest, src)) => (skip_space(rest), Some(src)),
            Err(_) => (input, None),
        };

        let (rest, verb) = token(input).map_err(|_| MessageParseError::MissingCommand)?;

        Ok(ParsedLine {
            source,
            verb,
            params: parse_params(rest),
        })
    }
}
