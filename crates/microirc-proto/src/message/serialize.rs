use std::fmt::{self, Display, Formatter};

use super::nom_parser::is_space;
use super::types::Message;

/// The last parameter needs a `:` when it would not survive re-parsing as a
/// plain token.
fn needs_colon(param: &str) -> bool {
    param.is_empty() || param.starts_with(':') || param.chars().any(is_space)
}

impl Display for Message {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if let Some(ref source) = self.source {
            write!(f, ":{} ", source)?;
        }

        write!(f, "{}", self.verb)?;

        if let Some((last, middle)) = self.params.split_last() {
            for param in middle {
                write!(f, " {}", param)?;
            }
            if needs_colon(last) {
                write!(f, " :{}", last)?;
            } else {
                write!(f, " {}", last)?;
            }
        }

        Ok(())
    }
}
