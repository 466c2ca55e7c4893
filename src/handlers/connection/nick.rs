//! NICK handler.

use microirc_proto::{Message, NickExt};
use tracing::info;

use super::super::{Context, Handler};
use super::welcome::try_register;
use crate::error::{HandlerError, HandlerResult};

/// Handler for NICK command.
pub struct NickHandler;

impl Handler for NickHandler {
    fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        let Some(nick) = msg.arg(0).filter(|n| !n.is_empty()) else {
            return Err(HandlerError::NoNicknameGiven);
        };

        let max_len = ctx.state.info.limits.nick_len;
        if !nick.is_valid_nick() || !nick.is_valid_nick_len(max_len) {
            return Err(HandlerError::ErroneousNickname(nick.to_string()));
        }

        if let Some(owner) = ctx.state.find_nick(nick) {
            if owner != ctx.id {
                return Err(HandlerError::NicknameInUse(nick.to_string()));
            }
            // Same client; only a case change is worth doing.
            if ctx.client()?.nick.as_deref() == Some(nick) {
                return Ok(());
            }
        }

        let client = ctx.client()?;
        if !client.is_registered() {
            ctx.state.set_nick(ctx.id, nick);
            return try_register(ctx);
        }

        let change = Message::new("NICK", [nick]).with_source(client.mask());
        let old = client.nick_or_star().to_string();
        ctx.send(change.clone());
        for peer in ctx.state.peers_of(ctx.id).keys() {
            ctx.state.send(*peer, change.clone());
        }
        ctx.state.set_nick(ctx.id, nick);
        info!(conn = %ctx.id, old = %old, new = %nick, "Nick changed");
        Ok(())
    }
}
