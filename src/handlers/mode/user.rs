//! User mode handling.

use microirc_proto::{irc_eq, Message, ModeChange, Response};

use super::super::helpers::err_noprivileges;
use super::super::Context;
use crate::error::{HandlerError, HandlerResult};
use crate::modes::{user_mode_string, Access, ModeEngine, ModeErrors, USER_MODES};

pub(super) fn handle_user_mode(ctx: &mut Context<'_>, target: &str, msg: &Message) -> HandlerResult {
    let client = ctx.client()?;
    if !irc_eq(client.nick_or_star(), target) {
        if ctx.state.find_nick(target).is_none() {
            return Err(HandlerError::NoSuchNick(target.to_string()));
        }
        ctx.reply(
            Response::ERR_USERSDONTMATCH,
            ["Cannot change mode for other users"],
        );
        return Ok(());
    }

    let Some(modes) = msg.arg(1) else {
        ctx.reply(Response::RPL_UMODEIS, [user_mode_string(client.modes)]);
        return Ok(());
    };

    let actor = super::actor(ctx)?;
    let params = msg.args_from(2);
    let outcome = {
        let client = ctx.client_mut()?;
        ModeEngine::new(USER_MODES, &actor, client, &(), Access::Granted).process(modes, &params)
    };

    if outcome.errors.contains(ModeErrors::UNKNOWN_CHAR) {
        ctx.reply(Response::ERR_UMODEUNKNOWNFLAG, ["Unknown MODE flag"]);
    }
    if outcome.errors.contains(ModeErrors::NOT_OPER) {
        ctx.send(err_noprivileges(ctx.server_name(), &actor.nick));
    }
    // Attempts to set +o are ignored without a reply.

    if !outcome.changes.is_empty() {
        let mut params = vec![actor.nick.clone()];
        params.extend(ModeChange::to_params(&outcome.changes));
        ctx.send(Message::new("MODE", params).with_source(actor.nick.as_str()));
    }
    Ok(())
}
