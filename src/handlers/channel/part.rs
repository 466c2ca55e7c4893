//! PART handler.

use microirc_proto::{irc_to_lower, Message};
use tracing::debug;

use super::super::{Context, Handler};
use crate::error::{ChannelError, HandlerError, HandlerResult};

/// Handler for PART command.
///
/// `PART <channel>{,<channel>} [<reason>]`
pub struct PartHandler;

impl Handler for PartHandler {
    fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        let reason = msg.arg(1);
        for name in msg.arg(0).unwrap_or("").split(',').filter(|n| !n.is_empty()) {
            if let Err(e) = part_channel(ctx, name, reason) {
                let nick = ctx.nick();
                if let Some(reply) = e.to_irc_reply(ctx.server_name(), &nick, "PART") {
                    ctx.send(reply);
                }
            }
        }
        Ok(())
    }
}

fn part_channel(ctx: &mut Context<'_>, name: &str, reason: Option<&str>) -> HandlerResult {
    let chan_key = irc_to_lower(name);
    let Some(channel) = ctx.state.channels.get(&chan_key) else {
        return Err(HandlerError::NoSuchChannel(name.to_string()));
    };
    if !channel.is_member(ctx.id) {
        return Err(ChannelError::NotOnChannel.on(name));
    }

    let mut params = vec![channel.name.clone()];
    params.extend(reason.map(str::to_string));
    let part = Message::new("PART", params).with_source(ctx.client()?.mask());
    ctx.state.broadcast(&chan_key, &part, None);

    ctx.state.remove_member(ctx.id, &chan_key);
    debug!(conn = %ctx.id, channel = %name, "Parted channel");
    Ok(())
}
