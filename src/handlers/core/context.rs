//! Handler context and the handler trait.

use microirc_proto::{Message, Response};

use crate::error::{HandlerError, HandlerResult};
use crate::state::{Client, ConnContext, ConnId, ServerState};

/// Everything a handler may touch while processing one message.
pub struct Context<'a> {
    /// The connection the message arrived on.
    pub id: ConnId,
    pub state: &'a mut ServerState,
}

impl<'a> Context<'a> {
    pub fn new(id: ConnId, state: &'a mut ServerState) -> Self {
        Self { id, state }
    }

    pub fn server_name(&self) -> &str {
        &self.state.info.name
    }

    pub fn client(&self) -> Result<&Client, HandlerError> {
        self.state
            .clients
            .get(&self.id)
            .ok_or_else(|| HandlerError::Internal(format!("no client for connection {}", self.id)))
    }

    pub fn client_mut(&mut self) -> Result<&mut Client, HandlerError> {
        let id = self.id;
        self.state
            .clients
            .get_mut(&id)
            .ok_or_else(|| HandlerError::Internal(format!("no client for connection {id}")))
    }

    /// Registration state of this connection.
    pub fn conn_context(&self) -> ConnContext {
        self.state
            .clients
            .get(&self.id)
            .map_or(ConnContext::Unregistered, |c| c.context)
    }

    /// Nick for replies, `*` before one is set.
    pub fn nick(&self) -> String {
        self.state.nick_or_star(self.id)
    }

    pub fn send(&self, msg: Message) {
        self.state.send(self.id, msg);
    }

    /// Numeric reply addressed to this connection.
    pub fn reply<I, P>(&self, response: Response, params: I)
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        self.state.reply(self.id, response, params);
    }
}

/// A command handler.
///
/// Handlers own all side effects of a command. Returning an error makes the
/// dispatcher send the matching numeric, so handlers only send replies for
/// partial failures they recover from.
pub trait Handler: Send + Sync {
    fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult;
}
