//! PING and PONG handlers.

use microirc_proto::Message;

use super::super::{Context, Handler};
use crate::error::HandlerResult;

/// Handler for PING command.
pub struct PingHandler;

impl Handler for PingHandler {
    fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        // PING <token>
        let token = msg.arg(0).unwrap_or("");
        let server = ctx.server_name().to_string();
        let pong = Message::new("PONG", [server.as_str(), token]).with_source(server.as_str());
        ctx.send(pong);
        Ok(())
    }
}

/// Handler for PONG command.
pub struct PongHandler;

impl Handler for PongHandler {
    fn handle(&self, _ctx: &mut Context<'_>, _msg: &Message) -> HandlerResult {
        // Liveness is tracked by the connection task.
        Ok(())
    }
}
