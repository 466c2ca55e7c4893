//! Unified error handling for microircd.
//!
//! Handler failures map to numeric replies; registry failures are startup
//! errors.

use microirc_proto::{Message, Response};
use thiserror::Error;

use crate::state::ConnContext;

// ============================================================================
// Handler Errors (command processing)
// ============================================================================

/// Errors that can occur during command handling.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("not enough parameters")]
    NeedMoreParams,

    #[error("no recipient given")]
    NoRecipient,

    #[error("no text to send")]
    NoTextToSend,

    #[error("no nickname given")]
    NoNicknameGiven,

    #[error("nickname in use: {0}")]
    NicknameInUse(String),

    #[error("erroneous nickname: {0}")]
    ErroneousNickname(String),

    #[error("not registered")]
    NotRegistered,

    #[error("already registered")]
    AlreadyRegistered,

    #[error("no such nick: {0}")]
    NoSuchNick(String),

    #[error("no such channel: {0}")]
    NoSuchChannel(String),

    #[error("unknown command: {0}")]
    UnknownCommand(String),

    #[error("channel error on {channel}: {error}")]
    Channel {
        channel: String,
        #[source]
        error: ChannelError,
    },

    #[error("client quit: {0:?}")]
    Quit(Option<String>),

    #[error("internal error: {0}")]
    Internal(String),
}

impl HandlerError {
    /// Short label for logs.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NeedMoreParams => "need_more_params",
            Self::NoRecipient => "no_recipient",
            Self::NoTextToSend => "no_text_to_send",
            Self::NoNicknameGiven => "no_nickname_given",
            Self::NicknameInUse(_) => "nickname_in_use",
            Self::ErroneousNickname(_) => "erroneous_nickname",
            Self::NotRegistered => "not_registered",
            Self::AlreadyRegistered => "already_registered",
            Self::NoSuchNick(_) => "no_such_nick",
            Self::NoSuchChannel(_) => "no_such_channel",
            Self::UnknownCommand(_) => "unknown_command",
            Self::Channel { .. } => "channel_error",
            Self::Quit(_) => "quit",
            Self::Internal(_) => "internal_error",
        }
    }

    /// Convert to an IRC error reply message.
    ///
    /// Returns `None` for errors that don't warrant a client-visible reply.
    pub fn to_irc_reply(&self, server_name: &str, nick: &str, verb: &str) -> Option<Message> {
        let (response, params): (Response, Vec<String>) = match self {
            Self::NeedMoreParams => (
                Response::ERR_NEEDMOREPARAMS,
                vec![verb.to_string(), "Not enough parameters".to_string()],
            ),
            Self::NoRecipient => (
                Response::ERR_NORECIPIENT,
                vec![format!("No recipient given ({verb})")],
            ),
            Self::NoTextToSend => (
                Response::ERR_NOTEXTTOSEND,
                vec!["No text to send".to_string()],
            ),
            Self::NoNicknameGiven => (
                Response::ERR_NONICKNAMEGIVEN,
                vec!["No nickname given".to_string()],
            ),
            Self::NicknameInUse(bad) => (
                Response::ERR_NICKNAMEINUSE,
                vec![bad.clone(), "Nickname is already in use".to_string()],
            ),
            Self::ErroneousNickname(bad) => (
                Response::ERR_ERRONEUSNICKNAME,
                vec![bad.clone(), "Erroneous nickname".to_string()],
            ),
            Self::NotRegistered => (
                Response::ERR_NOTREGISTERED,
                vec!["You have not registered".to_string()],
            ),
            Self::AlreadyRegistered => (
                Response::ERR_ALREADYREGISTRED,
                vec!["You may not reregister".to_string()],
            ),
            Self::NoSuchNick(target) => (
                Response::ERR_NOSUCHNICK,
                vec![target.clone(), "No such nick/channel".to_string()],
            ),
            Self::NoSuchChannel(chan) => (
                Response::ERR_NOSUCHCHANNEL,
                vec![chan.clone(), "No such channel".to_string()],
            ),
            Self::UnknownCommand(cmd) => (
                Response::ERR_UNKNOWNCOMMAND,
                vec![cmd.clone(), "Unknown command".to_string()],
            ),
            Self::Channel { channel, error } => {
                return Some(error.to_irc_reply(server_name, nick, channel));
            }

            Self::Quit(_) | Self::Internal(_) => return None,
        };
        Some(Message::numeric(server_name, response, nick, params))
    }
}

/// Result type for command handlers.
pub type HandlerResult = Result<(), HandlerError>;

// ============================================================================
// Channel Errors
// ============================================================================

/// Channel operation errors, each with its own numeric.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelError {
    #[error("not on channel")]
    NotOnChannel,

    #[error("you're not channel operator")]
    ChanOpPrivsNeeded,

    #[error("cannot send to channel")]
    CannotSendToChan,

    #[error("bad channel mask")]
    BadChanMask,

    #[error("cannot join channel (+b)")]
    BannedFromChan,

    #[error("cannot join channel (+i)")]
    InviteOnlyChan,

    #[error("cannot join channel (+l)")]
    ChannelIsFull,

    #[error("cannot join channel (+k)")]
    BadChannelKey,
}

impl ChannelError {
    /// Wrap into a [`HandlerError`] for `channel`.
    pub fn on(self, channel: impl Into<String>) -> HandlerError {
        HandlerError::Channel {
            channel: channel.into(),
            error: self,
        }
    }

    /// Convert to an IRC error reply message.
    pub fn to_irc_reply(&self, server_name: &str, nick: &str, channel: &str) -> Message {
        let (response, text) = match self {
            Self::NotOnChannel => (Response::ERR_NOTONCHANNEL, "You're not on that channel"),
            Self::ChanOpPrivsNeeded => {
                (Response::ERR_CHANOPRIVSNEEDED, "You're not channel operator")
            }
            Self::CannotSendToChan => (Response::ERR_CANNOTSENDTOCHAN, "Cannot send to channel"),
            Self::BadChanMask => (Response::ERR_BADCHANMASK, "Bad Channel Mask"),
            Self::BannedFromChan => (Response::ERR_BANNEDFROMCHAN, "Cannot join channel (+b)"),
            Self::InviteOnlyChan => (Response::ERR_INVITEONLYCHAN, "Cannot join channel (+i)"),
            Self::ChannelIsFull => (Response::ERR_CHANNELISFULL, "Cannot join channel (+l)"),
            Self::BadChannelKey => (Response::ERR_BADCHANNELKEY, "Cannot join channel (+k)"),
        };
        Message::numeric(server_name, response, nick, [channel, text])
    }
}

// ============================================================================
// Registry Errors (startup)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("{verb} is already registered in the {context:?} context")]
    Duplicate { verb: String, context: ConnContext },
}
