//! Registration completion and the welcome burst.

use microirc_proto::Response;
use tracing::info;

use super::super::Context;
use crate::error::HandlerResult;
use crate::modes::{channel_mode_letters, chanmodes_isupport, prefix_isupport, user_mode_letters};
use crate::state::ConnContext;

/// Promote the connection to a user once both NICK and USER are in.
pub(super) fn try_register(ctx: &mut Context<'_>) -> HandlerResult {
    let client = ctx.client_mut()?;
    if client.context != ConnContext::Unregistered || client.nick.is_none() || client.user.is_none()
    {
        return Ok(());
    }
    client.context = ConnContext::User;
    let mask = client.mask();

    info!(conn = %ctx.id, mask = %mask, "Client registered");
    send_welcome(ctx, &mask);
    Ok(())
}

fn send_welcome(ctx: &Context<'_>, mask: &str) {
    let info = &ctx.state.info;

    ctx.reply(
        Response::RPL_WELCOME,
        [format!(
            "Welcome to the {} Internet Relay Chat Network {}",
            info.network, mask
        )],
    );
    ctx.reply(
        Response::RPL_YOURHOST,
        [format!(
            "Your host is {}, running version {}",
            info.name, info.version
        )],
    );
    ctx.reply(
        Response::RPL_CREATED,
        [format!(
            "This server was created {}",
            info.created.format("%a %b %d %Y at %H:%M:%S UTC")
        )],
    );
    ctx.reply(
        Response::RPL_MYINFO,
        [
            info.name.clone(),
            info.version.clone(),
            user_mode_letters(),
            channel_mode_letters(),
        ],
    );

    ctx.reply(
        Response::RPL_ISUPPORT,
        [
            format!("CHANMODES={}", chanmodes_isupport()),
            format!("PREFIX={}", prefix_isupport()),
            "CHANTYPES=#&".to_string(),
            "CASEMAPPING=rfc1459".to_string(),
            format!("NICKLEN={}", info.limits.nick_len),
            format!("CHANNELLEN={}", info.limits.channel_len),
            format!("MAXLIST=beI:{}", info.limits.max_list_entries),
            format!("NETWORK={}", info.network),
            "are supported by this server".to_string(),
        ],
    );
}
