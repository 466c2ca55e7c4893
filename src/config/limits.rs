//! Protocol limits configuration.

use serde::Deserialize;

/// Protocol limits, advertised in RPL_ISUPPORT where applicable.
#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    /// Maximum nickname length (default: 30).
    #[serde(default = "default_nick_len")]
    pub nick_len: usize,
    /// Maximum channel name length, prefix included (default: 50).
    #[serde(default = "default_channel_len")]
    pub channel_len: usize,
    /// Maximum line length in bytes, terminator included (default: 512).
    #[serde(default = "default_line_len")]
    pub line_len: usize,
    /// Maximum entries per channel list mode (+b, +e, +I) (default: 64).
    #[serde(default = "default_max_list_entries")]
    pub max_list_entries: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            nick_len: default_nick_len(),
            channel_len: default_channel_len(),
            line_len: default_line_len(),
            max_list_entries: default_max_list_entries(),
        }
    }
}

fn default_nick_len() -> usize {
    microirc_proto::DEFAULT_NICK_MAX_LEN
}

fn default_channel_len() -> usize {
    microirc_proto::DEFAULT_CHANNEL_MAX_LEN
}

fn default_line_len() -> usize {
    microirc_proto::DEFAULT_MAX_LINE_LEN
}

fn default_max_list_entries() -> usize {
    64
}
