//! The core task: owns server state and the registry, and processes
//! connection events one at a time.

use microirc_proto::Message;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, trace};

use crate::error::HandlerError;
use crate::handlers::{Context, Registry};
use crate::state::{ConnContext, ConnId, ServerState};

/// Something that happened on a connection.
#[derive(Debug)]
pub enum Event {
    Connected {
        host: String,
        sender: mpsc::UnboundedSender<Message>,
        reply: oneshot::Sender<ConnId>,
    },
    Line {
        id: ConnId,
        line: String,
    },
    Closed {
        id: ConnId,
    },
}

pub struct Dispatcher {
    pub state: ServerState,
    registry: Registry,
}

impl Dispatcher {
    pub fn new(state: ServerState, registry: Registry) -> Self {
        Self { state, registry }
    }

    /// Process events until every sender is gone.
    pub async fn run(mut self, mut events: mpsc::UnboundedReceiver<Event>) {
        while let Some(event) = events.recv().await {
            self.handle_event(event);
        }
        info!("Dispatcher stopped");
    }

    pub fn handle_event(&mut self, event: Event) {
        match event {
            Event::Connected {
                host,
                sender,
                reply,
            } => {
                let id = self.state.add_client(host, sender);
                debug!(conn = %id, "Client added");
                if reply.send(id).is_err() {
                    self.state.remove_client(id, "Connection lost");
                }
            }
            Event::Line { id, line } => self.handle_line(id, &line),
            Event::Closed { id } => {
                if self.state.remove_client(id, "Connection closed").is_some() {
                    debug!(conn = %id, "Client removed after socket close");
                }
            }
        }
    }

    /// Parse and dispatch one line. Unparseable lines are dropped.
    pub fn handle_line(&mut self, id: ConnId, line: &str) {
        let msg = match line.parse::<Message>() {
            Ok(msg) => msg,
            Err(e) => {
                trace!(conn = %id, error = %e, "Dropping unparseable line");
                return;
            }
        };

        let mut ctx = Context::new(id, &mut self.state);
        let context = ctx.conn_context();
        match self.registry.dispatch(&mut ctx, &msg) {
            Ok(()) => {}
            Err(HandlerError::Quit(reason)) => {
                let reason = match reason {
                    Some(text) => format!("Quit: {text}"),
                    None => "Client Quit".to_string(),
                };
                self.disconnect(id, &reason);
            }
            // Peer servers get no error replies.
            Err(_) if context == ConnContext::Server => {}
            Err(e) => {
                let nick = self.state.nick_or_star(id);
                if let Some(reply) = e.to_irc_reply(&self.state.info.name, &nick, &msg.verb) {
                    self.state.send(id, reply);
                }
            }
        }
    }

    /// Send ERROR and drop the client. The connection task exits once its
    /// queue drains.
    fn disconnect(&mut self, id: ConnId, reason: &str) {
        if let Some(client) = self.state.clients.get(&id) {
            let text = format!("Closing Link: {} ({})", client.host, reason);
            client.send(Message::new("ERROR", [text]));
        }
        self.state.remove_client(id, reason);
    }
}
