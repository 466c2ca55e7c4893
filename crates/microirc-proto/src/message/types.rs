use crate::response::Response;

/// An owned protocol message.
///
/// Holds the optional source, the uppercased verb, and the ordered parameters
/// (the trailing parameter, if any, is simply the last element).
///
/// # Example
///
/// ```
/// use microirc_proto::Message;
///
/// let msg: Message = "privmsg #rust :Hello, world!".parse().unwrap();
/// assert_eq!(msg.verb, "PRIVMSG");
/// assert_eq!(msg.arg(1), Some("Hello, world!"));
///
/// let reply = Message::new("PRIVMSG", ["#rust", "hi"]).with_source("bot!bot@host");
/// assert_eq!(reply.to_string(), ":bot!bot@host PRIVMSG #rust hi");
/// ```
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Message {
    /// Message source (`nick!user@host` or a server name).
    pub source: Option<String>,
    /// The verb, uppercased on parse.
    pub verb: String,
    /// Parameters, in order.
    pub params: Vec<String>,
}

impl Message {
    /// Build a message from a verb and parameters.
    pub fn new<V, I, P>(verb: V, params: I) -> Self
    where
        V: Into<String>,
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        Message {
            source: None,
            verb: verb.into(),
            params: params.into_iter().map(Into::into).collect(),
        }
    }

    /// Build a numeric reply from `server` addressed to `target`.
    ///
    /// The numeric is rendered as its three-digit code and `target` becomes
    /// the first parameter.
    pub fn numeric<I, P>(server: &str, response: Response, target: &str, params: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        let mut all = vec![target.to_owned()];
        all.extend(params.into_iter().map(Into::into));
        Message {
            source: Some(server.to_owned()),
            verb: format!("{:03}", response.code()),
            params: all,
        }
    }

    /// Set the source of this message.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Parameter at `index`, if present.
    #[inline]
    pub fn arg(&self, index: usize) -> Option<&str> {
        self.params.get(index).map(String::as_str)
    }

    /// Number of parameters.
    #[inline]
    pub fn argc(&self) -> usize {
        self.params.len()
    }

    /// Parameters starting at `index` as string slices.
    pub fn args_from(&self, index: usize) -> Vec<&str> {
        self.params
            .iter()
            .skip(index)
            .map(String::as_str)
            .collect()
    }

    /// Nickname portion of a `nick!user@host` source.
    pub fn source_nickname(&self) -> Option<&str> {
        let source = self.source.as_deref()?;
        Some(source.split(['!', '@']).next().unwrap_or(source))
    }
}
