//! PRIVMSG and NOTICE handlers.

use microirc_proto::{irc_to_lower, ChannelExt, Message};

use super::{Context, Handler};
use crate::error::{ChannelError, HandlerError, HandlerResult};
use crate::state::{Channel, ChannelModes, ConnId};

/// Handler for PRIVMSG and NOTICE.
///
/// NOTICE never generates error replies.
pub struct MessageHandler {
    verb: &'static str,
    notice: bool,
}

impl MessageHandler {
    pub fn privmsg() -> Self {
        Self {
            verb: "PRIVMSG",
            notice: false,
        }
    }

    pub fn notice() -> Self {
        Self {
            verb: "NOTICE",
            notice: true,
        }
    }

    fn deliver(&self, ctx: &Context<'_>, target: &str, text: &str) -> HandlerResult {
        let client = ctx.client()?;
        let out = Message::new(self.verb, [target, text]).with_source(client.mask());

        if target.is_channel_name() {
            let chan_key = irc_to_lower(target);
            let Some(channel) = ctx.state.channels.get(&chan_key) else {
                return Err(HandlerError::NoSuchNick(target.to_string()));
            };
            if !may_send(channel, ctx.id, &client.mask()) {
                return Err(ChannelError::CannotSendToChan.on(&channel.name));
            }
            ctx.state.broadcast(&chan_key, &out, Some(ctx.id));
            return Ok(());
        }

        let Some(recipient) = ctx.state.find_nick(target) else {
            return Err(HandlerError::NoSuchNick(target.to_string()));
        };
        ctx.state.send(recipient, out);
        Ok(())
    }
}

/// +n keeps outsiders out, +m silences unvoiced members, and bans silence
/// everyone without status.
fn may_send(channel: &Channel, id: ConnId, mask: &str) -> bool {
    let has_status = channel
        .members
        .get(&id)
        .is_some_and(|status| !status.is_empty());
    if has_status {
        return true;
    }
    if !channel.is_member(id) && channel.modes.contains(ChannelModes::NO_EXTERNAL) {
        return false;
    }
    channel.can_speak(id) && !channel.is_banned(mask)
}

impl Handler for MessageHandler {
    fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        let Some(targets) = msg.arg(0).filter(|t| !t.is_empty()) else {
            return if self.notice {
                Ok(())
            } else {
                Err(HandlerError::NoRecipient)
            };
        };
        let Some(text) = msg.arg(1).filter(|t| !t.is_empty()) else {
            return if self.notice {
                Ok(())
            } else {
                Err(HandlerError::NoTextToSend)
            };
        };

        for target in targets.split(',').filter(|t| !t.is_empty()) {
            if let Err(e) = self.deliver(ctx, target, text) {
                if self.notice {
                    continue;
                }
                let nick = ctx.nick();
                if let Some(reply) = e.to_irc_reply(ctx.server_name(), &nick, self.verb) {
                    ctx.send(reply);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_support::{add_user, drain, test_info};
    use crate::state::{MemberModes, ServerState};

    #[test]
    fn test_privmsg_to_nick_and_channel() {
        let mut state = ServerState::new(test_info());
        let (a, mut ra) = add_user(&mut state, "alice");
        let (b, mut rb) = add_user(&mut state, "bob");
        state.add_member(a, "#c", "#c");
        state.add_member(b, "#c", "#c");

        let mut ctx = Context::new(a, &mut state);
        let handler = MessageHandler::privmsg();
        handler
            .handle(&mut ctx, &Message::new("PRIVMSG", ["BOB,#c", "hi there"]))
            .unwrap();

        assert_eq!(
            drain(&mut rb),
            [
                ":alice!alice@127.0.0.1 PRIVMSG BOB :hi there",
                ":alice!alice@127.0.0.1 PRIVMSG #c :hi there",
            ]
        );
        // The sender doesn't get its own channel message back.
        assert!(drain(&mut ra).is_empty());
    }

    #[test]
    fn test_moderated_and_no_external() {
        let mut state = ServerState::new(test_info());
        let (a, _ra) = add_user(&mut state, "alice");
        let (b, mut rb) = add_user(&mut state, "bob");
        let (c, mut rc) = add_user(&mut state, "carol");
        state.add_member(a, "#c", "#c");
        state.add_member(b, "#c", "#c");
        state.channels.get_mut("#c").unwrap().modes =
            ChannelModes::MODERATED | ChannelModes::NO_EXTERNAL;

        let handler = MessageHandler::privmsg();
        let mut ctx = Context::new(b, &mut state);
        handler
            .handle(&mut ctx, &Message::new("PRIVMSG", ["#c", "hello"]))
            .unwrap();
        assert_eq!(drain(&mut rb), [":irc.test 404 bob #c :Cannot send to channel"]);

        let mut ctx = Context::new(c, &mut state);
        handler
            .handle(&mut ctx, &Message::new("PRIVMSG", ["#c", "hello"]))
            .unwrap();
        assert_eq!(drain(&mut rc), [":irc.test 404 carol #c :Cannot send to channel"]);

        state
            .channels
            .get_mut("#c")
            .unwrap()
            .members
            .insert(b, MemberModes::VOICE);
        let mut ctx = Context::new(b, &mut state);
        handler
            .handle(&mut ctx, &Message::new("PRIVMSG", ["#c", "hello"]))
            .unwrap();
        assert!(drain(&mut rb).is_empty());
    }

    #[test]
    fn test_missing_recipient_and_text() {
        let mut state = ServerState::new(test_info());
        let (a, _ra) = add_user(&mut state, "alice");
        let mut ctx = Context::new(a, &mut state);

        let privmsg = MessageHandler::privmsg();
        assert!(matches!(
            privmsg.handle(&mut ctx, &Message::new("PRIVMSG", Vec::<String>::new())),
            Err(HandlerError::NoRecipient)
        ));
        assert!(matches!(
            privmsg.handle(&mut ctx, &Message::new("PRIVMSG", ["bob"])),
            Err(HandlerError::NoTextToSend)
        ));

        let notice = MessageHandler::notice();
        assert!(notice
            .handle(&mut ctx, &Message::new("NOTICE", ["nobody", "hi"]))
            .is_ok());
    }
}
