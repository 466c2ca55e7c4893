//! Channel name validation.
//!
//! # Reference
//! - RFC 2812 Section 1.3: Channel names

/// Default maximum channel name length, prefix included.
pub const DEFAULT_CHANNEL_MAX_LEN: usize = 50;

/// Extension trait for validating channel names.
pub trait ChannelExt {
    /// True if this looks like a channel name: a `#` or `&` prefix, no
    /// space, comma, BEL or other control character, and at most
    /// [`DEFAULT_CHANNEL_MAX_LEN`] characters.
    fn is_channel_name(&self) -> bool;

    /// Same as [`ChannelExt::is_channel_name`] with a server-specific length limit.
    fn is_channel_name_len(&self, max_len: usize) -> bool;
}

impl ChannelExt for str {
    fn is_channel_name(&self) -> bool {
        self.is_channel_name_len(DEFAULT_CHANNEL_MAX_LEN)
    }

    fn is_channel_name_len(&self, max_len: usize) -> bool {
        let mut chars = self.chars();
        if !matches!(chars.next(), Some('#' | '&')) {
            return false;
        }
        if self.chars().count() > max_len {
            return false;
        }
        chars.all(|c| c != ' ' && c != ',' && !c.is_control())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_channels() {
        assert!("#channel".is_channel_name());
        assert!("&local".is_channel_name());
        assert!("#".is_channel_name());
    }

    #[test]
    fn test_invalid_channels() {
        assert!(!"channel".is_channel_name());
        assert!(!"+modeless".is_channel_name());
        assert!(!"#chan nel".is_channel_name());
        assert!(!"#chan,nel".is_channel_name());
        assert!(!"#bell\x07".is_channel_name());
        assert!(!"".is_channel_name());
    }

    #[test]
    fn test_length_limit() {
        let name = format!("#{}", "x".repeat(49));
        assert!(name.is_channel_name());
        assert!(!format!("{name}y").is_channel_name());
        assert!(!"#abcdef".is_channel_name_len(5));
    }
}
