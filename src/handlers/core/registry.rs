//! Command handler registry and dispatch.
//!
//! One table per connection context, each an [`OrderedMap`] from verb to
//! handler registration.

use std::sync::Arc;

use microirc_proto::Message;
use tracing::{debug, span, Level};

use crate::error::{HandlerError, HandlerResult, RegistryError};
use crate::handlers::{
    Context, Handler, JoinHandler, MessageHandler, ModeHandler, NamesHandler, NickHandler,
    PartHandler, PingHandler, PongHandler, QuitHandler, UserHandler,
};
use crate::state::{ConnContext, OrderedMap};

/// Contexts a registration applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Only(ConnContext),
    All,
}

struct Registration {
    handler: Arc<dyn Handler>,
    min_args: usize,
}

/// Registry of command handlers.
pub struct Registry {
    tables: [OrderedMap<String, Registration>; 3],
}

impl Registry {
    /// A registry with nothing registered.
    pub fn empty() -> Self {
        Self {
            tables: Default::default(),
        }
    }

    /// Create a registry with all handlers registered.
    pub fn new() -> Result<Self, RegistryError> {
        use ConnContext::{Unregistered, User};

        let mut registry = Self::empty();

        // Connection/registration handlers
        registry.register("NICK", Scope::Only(Unregistered), 0, Arc::new(NickHandler))?;
        registry.register("NICK", Scope::Only(User), 0, Arc::new(NickHandler))?;
        registry.register("USER", Scope::Only(Unregistered), 4, Arc::new(UserHandler))?;
        registry.register("USER", Scope::Only(User), 0, Arc::new(UserHandler))?;
        registry.register("PING", Scope::All, 1, Arc::new(PingHandler))?;
        registry.register("PONG", Scope::All, 0, Arc::new(PongHandler))?;
        registry.register("QUIT", Scope::All, 0, Arc::new(QuitHandler))?;

        // Channel handlers
        registry.register("JOIN", Scope::Only(User), 1, Arc::new(JoinHandler))?;
        registry.register("PART", Scope::Only(User), 1, Arc::new(PartHandler))?;
        registry.register("NAMES", Scope::Only(User), 0, Arc::new(NamesHandler))?;
        registry.register("MODE", Scope::Only(User), 1, Arc::new(ModeHandler))?;

        // Messaging handlers
        registry.register("PRIVMSG", Scope::Only(User), 0, Arc::new(MessageHandler::privmsg()))?;
        registry.register("NOTICE", Scope::Only(User), 0, Arc::new(MessageHandler::notice()))?;

        Ok(registry)
    }

    /// Register `handler` for `verb` in the contexts named by `scope`.
    ///
    /// With [`Scope::All`] the contexts are filled in order and the first
    /// duplicate stops registration; contexts already filled stay filled.
    pub fn register(
        &mut self,
        verb: &str,
        scope: Scope,
        min_args: usize,
        handler: Arc<dyn Handler>,
    ) -> Result<(), RegistryError> {
        let verb = verb.to_ascii_uppercase();
        let contexts: &[ConnContext] = match &scope {
            Scope::Only(context) => std::slice::from_ref(context),
            Scope::All => &ConnContext::ALL,
        };

        for &context in contexts {
            let table = &mut self.tables[context.index()];
            if table.contains_key(verb.as_str()) {
                return Err(RegistryError::Duplicate { verb, context });
            }
            table.insert(
                verb.clone(),
                Registration {
                    handler: Arc::clone(&handler),
                    min_args,
                },
            );
        }
        Ok(())
    }

    pub fn contains(&self, context: ConnContext, verb: &str) -> bool {
        self.tables[context.index()].contains_key(verb)
    }

    /// Verbs registered for `context`, in order.
    pub fn verbs(&self, context: ConnContext) -> impl Iterator<Item = &str> + '_ {
        self.tables[context.index()].keys().map(String::as_str)
    }

    /// Dispatch a message to the handler for the connection's context.
    ///
    /// An unknown verb, a verb only valid after registration, or too few
    /// arguments is returned as an error without running any handler.
    pub fn dispatch(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        let context = ctx.conn_context();
        let Some(registration) = self.tables[context.index()].get(msg.verb.as_str()) else {
            if context == ConnContext::Unregistered && self.contains(ConnContext::User, &msg.verb)
            {
                return Err(HandlerError::NotRegistered);
            }
            return Err(HandlerError::UnknownCommand(msg.verb.clone()));
        };

        if msg.argc() < registration.min_args {
            return Err(HandlerError::NeedMoreParams);
        }

        let channel = msg
            .arg(0)
            .filter(|a| a.starts_with('#') || a.starts_with('&'));
        let irc_span = span!(
            Level::DEBUG,
            "irc.command",
            command = %msg.verb,
            conn = %ctx.id,
            context = ?context,
            channel = channel,
        );
        let _enter = irc_span.enter();

        let result = registration.handler.handle(ctx, msg);
        if let Err(ref e) = result {
            debug!(command = %msg.verb, error = %e, code = e.error_code(), "Command error");
        }
        result
    }
}
