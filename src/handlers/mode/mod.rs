//! MODE command handler.
//!
//! Routes to channel or user mode handling based on the target.

mod channel;
mod user;

use microirc_proto::{ChannelExt, Message};

use super::{Context, Handler};
use crate::error::HandlerResult;
use crate::modes::Actor;

/// Handler for MODE command.
///
/// `MODE <target> [<modestring> [<mode-param>...]]`
pub struct ModeHandler;

impl Handler for ModeHandler {
    fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        let target = msg.arg(0).unwrap_or("");
        if target.is_channel_name() {
            channel::handle_channel_mode(ctx, target, msg)
        } else {
            user::handle_user_mode(ctx, target, msg)
        }
    }
}

fn actor(ctx: &Context<'_>) -> Result<Actor, crate::error::HandlerError> {
    let client = ctx.client()?;
    Ok(Actor {
        nick: client.nick_or_star().to_string(),
        mask: client.mask(),
        is_oper: client.is_oper(),
    })
}
