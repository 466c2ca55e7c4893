//! Mode tables and the engine that applies them.

mod channel;
mod engine;
mod user;

pub use channel::{
    CHANNEL_MODES, channel_mode_letters, channel_mode_params, chanmodes_isupport,
    prefix_isupport,
};
pub use engine::{Access, Actor, ModeEngine, ModeErrors, ModeOutcome};
pub use user::{USER_MODES, user_mode_letters, user_mode_string};
