//! Protocol message types and parsing.

mod nom_parser;
mod parse;
mod serialize;
mod types;

pub use self::types::Message;

/// Maximum number of parameters a single line may carry.
///
/// Without a trailing `:` parameter, anything past this many parameters is
/// dropped by the parser.
pub const MAX_PARAMS: usize = 15;
