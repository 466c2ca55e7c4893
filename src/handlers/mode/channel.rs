//! Channel mode handling.

use microirc_proto::{irc_to_lower, Message, ModeChange, Response};

use super::super::helpers::{
    err_needmoreparams, err_noprivileges, err_nosuchnick, err_unknownmode, err_usernotinchannel,
};
use super::super::Context;
use crate::error::{ChannelError, HandlerError, HandlerResult};
use crate::modes::{channel_mode_params, Access, ModeEngine, ModeErrors, ModeOutcome, CHANNEL_MODES};
use crate::state::ServerState;

pub(super) fn handle_channel_mode(
    ctx: &mut Context<'_>,
    target: &str,
    msg: &Message,
) -> HandlerResult {
    let chan_key = irc_to_lower(target);
    let Some(channel) = ctx.state.channels.get(&chan_key) else {
        return Err(HandlerError::NoSuchChannel(target.to_string()));
    };
    let is_member = channel.is_member(ctx.id);
    let is_op = channel.is_op(ctx.id);
    let name = channel.name.clone();

    let Some(modes) = msg.arg(1) else {
        let mut params = vec![name.clone()];
        params.extend(channel_mode_params(channel, is_member));
        let created = channel.created_at.to_string();
        ctx.reply(Response::RPL_CHANNELMODEIS, params);
        ctx.reply(Response::RPL_CREATIONTIME, [name, created]);
        return Ok(());
    };

    let actor = super::actor(ctx)?;
    let access = if is_op {
        Access::Granted
    } else {
        Access::QueryOnly
    };
    let params = msg.args_from(2);

    let outcome = {
        let ServerState {
            channels,
            nicks,
            info,
            ..
        } = &mut *ctx.state;
        let Some(channel) = channels.get_mut(&chan_key) else {
            return Err(HandlerError::NoSuchChannel(target.to_string()));
        };
        ModeEngine::new(CHANNEL_MODES, &actor, channel, nicks, access)
            .with_list_limit(info.limits.max_list_entries)
            .process(modes, &params)
    };

    report_errors(ctx, &name, &outcome);
    send_list_queries(ctx, &chan_key, &outcome.list_queries);

    if !outcome.changes.is_empty() {
        let mut params = vec![name];
        params.extend(ModeChange::to_params(&outcome.changes));
        let change = Message::new("MODE", params).with_source(actor.mask.as_str());
        ctx.state.broadcast(&chan_key, &change, None);
    }
    Ok(())
}

fn report_errors(ctx: &Context<'_>, channel: &str, outcome: &ModeOutcome) {
    let server = ctx.server_name();
    let nick = ctx.nick();

    for ch in outcome.unknown.chars() {
        ctx.send(err_unknownmode(server, &nick, ch, channel));
    }
    if outcome.errors.contains(ModeErrors::NO_ACCESS) {
        ctx.send(ChannelError::ChanOpPrivsNeeded.to_irc_reply(server, &nick, channel));
    }
    if outcome.errors.contains(ModeErrors::NOT_OPER) {
        ctx.send(err_noprivileges(server, &nick));
    }
    if outcome.errors.contains(ModeErrors::LIST_FULL) {
        ctx.reply(Response::ERR_BANLISTFULL, [channel, "Channel list is full"]);
    }
    for target in &outcome.unresolved {
        if ctx.state.find_nick(target).is_some() {
            ctx.send(err_usernotinchannel(server, &nick, target, channel));
        } else {
            ctx.send(err_nosuchnick(server, &nick, target));
        }
    }
    if outcome.missing_params > 0 {
        ctx.send(err_needmoreparams(server, &nick, "MODE"));
    }
}

fn send_list_queries(ctx: &Context<'_>, chan_key: &str, queries: &[char]) {
    let Some(channel) = ctx.state.channels.get(chan_key) else {
        return;
    };
    for &mode in queries {
        let (list, entry, end, text) = match mode {
            'b' => (
                &channel.bans,
                Response::RPL_BANLIST,
                Response::RPL_ENDOFBANLIST,
                "End of channel ban list",
            ),
            'e' => (
                &channel.excepts,
                Response::RPL_EXCEPTLIST,
                Response::RPL_ENDOFEXCEPTLIST,
                "End of channel exception list",
            ),
            'I' => (
                &channel.invex,
                Response::RPL_INVITELIST,
                Response::RPL_ENDOFINVITELIST,
                "End of channel invite list",
            ),
            _ => continue,
        };
        for item in list.values() {
            ctx.reply(
                entry,
                [
                    channel.name.clone(),
                    item.mask.clone(),
                    item.set_by.clone(),
                    item.set_at.to_string(),
                ],
            );
        }
        ctx.reply(end, [channel.name.as_str(), text]);
    }
}
