//! USER handler.

use microirc_proto::Message;

use super::super::{Context, Handler};
use super::welcome::try_register;
use crate::error::{HandlerError, HandlerResult};

/// Longest username kept.
const USER_LEN: usize = 10;

/// Handler for USER command.
///
/// `USER <username> <mode> <unused> <realname>`
pub struct UserHandler;

impl Handler for UserHandler {
    fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        let client = ctx.client()?;
        if client.is_registered() || client.user.is_some() {
            return Err(HandlerError::AlreadyRegistered);
        }

        let (Some(username), Some(realname)) = (msg.arg(0), msg.arg(3)) else {
            return Err(HandlerError::NeedMoreParams);
        };
        if username.is_empty() {
            return Err(HandlerError::NeedMoreParams);
        }

        let username: String = username
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '@')
            .take(USER_LEN)
            .collect();
        let client = ctx.client_mut()?;
        client.user = Some(username);
        client.realname = Some(realname.to_string());

        try_register(ctx)
    }
}
