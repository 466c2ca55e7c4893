//! JOIN handler.

use microirc_proto::{irc_to_lower, ChannelExt, Message};
use tracing::debug;

use super::super::{Context, Handler};
use super::names::send_names;
use crate::error::{ChannelError, HandlerResult};
use crate::state::ChannelModes;

/// Handler for JOIN command.
///
/// `JOIN <channel>{,<channel>} [<key>{,<key>}]`
pub struct JoinHandler;

impl Handler for JoinHandler {
    fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        let channels = msg.arg(0).unwrap_or("");
        let mut keys = msg.arg(1).unwrap_or("").split(',');

        for name in channels.split(',').filter(|n| !n.is_empty()) {
            let key = keys.next().filter(|k| !k.is_empty());
            // One bad channel doesn't stop the rest.
            if let Err(e) = join_channel(ctx, name, key) {
                let nick = ctx.nick();
                if let Some(reply) = e.to_irc_reply(ctx.server_name(), &nick, "JOIN") {
                    ctx.send(reply);
                }
            }
        }
        Ok(())
    }
}

fn join_channel(ctx: &mut Context<'_>, name: &str, key: Option<&str>) -> HandlerResult {
    let max_len = ctx.state.info.limits.channel_len;
    if !name.is_channel_name() || !name.is_channel_name_len(max_len) {
        return Err(ChannelError::BadChanMask.on(name));
    }

    let chan_key = irc_to_lower(name);
    let mask = ctx.client()?.mask();

    if let Some(channel) = ctx.state.channels.get(&chan_key) {
        if channel.is_member(ctx.id) {
            return Ok(());
        }
        if channel.key.is_some() && channel.key.as_deref() != key {
            return Err(ChannelError::BadChannelKey.on(&channel.name));
        }
        if channel.limit.is_some_and(|limit| channel.members.len() >= limit) {
            return Err(ChannelError::ChannelIsFull.on(&channel.name));
        }
        if channel.modes.contains(ChannelModes::INVITE_ONLY)
            && !channel.is_invite_excepted(&mask)
        {
            return Err(ChannelError::InviteOnlyChan.on(&channel.name));
        }
        if channel.is_banned(&mask) {
            return Err(ChannelError::BannedFromChan.on(&channel.name));
        }
    }

    ctx.state.add_member(ctx.id, &chan_key, name);
    debug!(conn = %ctx.id, channel = %name, "Joined channel");

    let display = ctx
        .state
        .channels
        .get(&chan_key)
        .map_or_else(|| name.to_string(), |c| c.name.clone());
    let join = Message::new("JOIN", [display]).with_source(mask);
    ctx.state.broadcast(&chan_key, &join, None);
    send_names(ctx, &chan_key);
    Ok(())
}
