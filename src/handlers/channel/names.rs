//! NAMES handler.

use microirc_proto::{irc_to_lower, Message, Response};

use super::super::{Context, Handler};
use crate::error::HandlerResult;
use crate::state::{Channel, ChannelModes, ConnId, ServerState, UserModes};

/// Room left in a 353 line for the nick list.
const NAMES_CHUNK: usize = 400;

/// Handler for NAMES command.
///
/// `NAMES [<channel>{,<channel>}]`
pub struct NamesHandler;

impl Handler for NamesHandler {
    fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        let Some(targets) = msg.arg(0).filter(|t| !t.is_empty()) else {
            let visible: Vec<String> = ctx
                .state
                .channels
                .iter()
                .filter(|(_, chan)| is_visible(chan, ctx.id))
                .map(|(key, _)| key.clone())
                .collect();
            for key in &visible {
                send_name_lines(ctx.state, ctx.id, key);
            }
            ctx.reply(Response::RPL_ENDOFNAMES, ["*", "End of /NAMES list"]);
            return Ok(());
        };

        for name in targets.split(',') {
            let key = irc_to_lower(name);
            let visible = ctx
                .state
                .channels
                .get(&key)
                .is_some_and(|chan| is_visible(chan, ctx.id));
            if visible {
                send_names(ctx, &key);
            } else {
                ctx.reply(Response::RPL_ENDOFNAMES, [name, "End of /NAMES list"]);
            }
        }
        Ok(())
    }
}

fn is_visible(channel: &Channel, id: ConnId) -> bool {
    channel.is_member(id) || !channel.modes.intersects(ChannelModes::SECRET | ChannelModes::PRIVATE)
}

/// Send 353 lines followed by 366 for one channel.
pub(crate) fn send_names(ctx: &Context<'_>, chan_key: &str) {
    send_name_lines(ctx.state, ctx.id, chan_key);
    if let Some(channel) = ctx.state.channels.get(chan_key) {
        ctx.reply(
            Response::RPL_ENDOFNAMES,
            [channel.name.as_str(), "End of /NAMES list"],
        );
    }
}

fn send_name_lines(state: &ServerState, id: ConnId, chan_key: &str) {
    let Some(channel) = state.channels.get(chan_key) else {
        return;
    };
    let symbol = if channel.modes.contains(ChannelModes::SECRET) {
        "@"
    } else if channel.modes.contains(ChannelModes::PRIVATE) {
        "*"
    } else {
        "="
    };
    let requester_inside = channel.is_member(id);

    let mut line = String::new();
    for (member, status) in channel.members.iter() {
        let Some(client) = state.clients.get(member) else {
            continue;
        };
        // Invisible users are only listed to people sharing the channel.
        if !requester_inside && client.modes.contains(UserModes::INVISIBLE) {
            continue;
        }
        if line.len() >= NAMES_CHUNK {
            state.reply(id, Response::RPL_NAMREPLY, [symbol, channel.name.as_str(), line.as_str()]);
            line.clear();
        }
        if !line.is_empty() {
            line.push(' ');
        }
        if let Some(prefix) = status.prefix_char() {
            line.push(prefix);
        }
        line.push_str(client.nick_or_star());
    }
    if !line.is_empty() {
        state.reply(id, Response::RPL_NAMREPLY, [symbol, channel.name.as_str(), line.as_str()]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_support::{add_user, drain, test_info};

    #[test]
    fn test_names_lists_prefixes_in_member_order() {
        let mut state = ServerState::new(test_info());
        let (a, mut ra) = add_user(&mut state, "alice");
        let (b, _rb) = add_user(&mut state, "bob");
        state.add_member(a, "#c", "#c");
        state.add_member(b, "#c", "#c");

        let mut ctx = Context::new(a, &mut state);
        NamesHandler
            .handle(&mut ctx, &Message::new("NAMES", ["#c"]))
            .unwrap();
        assert_eq!(
            drain(&mut ra),
            [
                ":irc.test 353 alice = #c :@alice bob",
                ":irc.test 366 alice #c :End of /NAMES list",
            ]
        );
    }

    #[test]
    fn test_secret_channel_hidden_from_outsiders() {
        let mut state = ServerState::new(test_info());
        let (a, _ra) = add_user(&mut state, "alice");
        let (b, mut rb) = add_user(&mut state, "bob");
        state.add_member(a, "#hidden", "#hidden");
        state
            .channels
            .get_mut("#hidden")
            .unwrap()
            .modes
            .insert(ChannelModes::SECRET);

        let mut ctx = Context::new(b, &mut state);
        NamesHandler
            .handle(&mut ctx, &Message::new("NAMES", ["#hidden"]))
            .unwrap();
        assert_eq!(drain(&mut rb), [":irc.test 366 bob #hidden :End of /NAMES list"]);

        NamesHandler
            .handle(&mut ctx, &Message::new("NAMES", Vec::<String>::new()))
            .unwrap();
        assert_eq!(drain(&mut rb), [":irc.test 366 bob * :End of /NAMES list"]);
    }
}
