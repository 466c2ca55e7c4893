//! QUIT handler.

use microirc_proto::Message;

use super::super::{Context, Handler};
use crate::error::{HandlerError, HandlerResult};

/// Handler for QUIT command.
pub struct QuitHandler;

impl Handler for QuitHandler {
    fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        let quit_msg = msg.arg(0).map(|s| s.to_string());

        tracing::info!(
            conn = %ctx.id,
            nick = %ctx.nick(),
            message = ?quit_msg,
            "Client quit"
        );

        // The dispatcher tears the connection down.
        Err(HandlerError::Quit(quit_msg))
    }
}
