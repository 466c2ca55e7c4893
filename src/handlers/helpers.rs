//! Helper functions for IRC command handlers.

use microirc_proto::{Message, Response};

/// Helper to create a server reply message (numeric response).
///
/// `params` starts with the target nick.
pub fn server_reply(server_name: &str, response: Response, params: Vec<String>) -> Message {
    Message::new(response.to_string(), params).with_source(server_name)
}

/// Create ERR_NOPRIVILEGES reply (481) - user is not an IRC operator.
pub fn err_noprivileges(server_name: &str, nick: &str) -> Message {
    server_reply(
        server_name,
        Response::ERR_NOPRIVILEGES,
        vec![
            nick.to_string(),
            "Permission Denied - You're not an IRC operator".to_string(),
        ],
    )
}

/// Create ERR_NEEDMOREPARAMS reply (461) - not enough parameters.
pub fn err_needmoreparams(server_name: &str, nick: &str, command: &str) -> Message {
    server_reply(
        server_name,
        Response::ERR_NEEDMOREPARAMS,
        vec![
            nick.to_string(),
            command.to_string(),
            "Not enough parameters".to_string(),
        ],
    )
}

/// Create ERR_NOSUCHNICK reply (401) - no such nick/channel.
pub fn err_nosuchnick(server_name: &str, nick: &str, target: &str) -> Message {
    server_reply(
        server_name,
        Response::ERR_NOSUCHNICK,
        vec![
            nick.to_string(),
            target.to_string(),
            "No such nick/channel".to_string(),
        ],
    )
}

/// Create ERR_USERNOTINCHANNEL reply (441) - they aren't on that channel.
pub fn err_usernotinchannel(server_name: &str, nick: &str, target: &str, channel: &str) -> Message {
    server_reply(
        server_name,
        Response::ERR_USERNOTINCHANNEL,
        vec![
            nick.to_string(),
            target.to_string(),
            channel.to_string(),
            "They aren't on that channel".to_string(),
        ],
    )
}

/// Create ERR_UNKNOWNMODE reply (472).
pub fn err_unknownmode(server_name: &str, nick: &str, mode: char, channel: &str) -> Message {
    server_reply(
        server_name,
        Response::ERR_UNKNOWNMODE,
        vec![
            nick.to_string(),
            mode.to_string(),
            format!("is unknown mode char to me for {channel}"),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_reply() {
        let msg = err_needmoreparams("irc.test", "alice", "MODE");
        assert_eq!(msg.to_string(), ":irc.test 461 alice MODE :Not enough parameters");

        let msg = err_unknownmode("irc.test", "alice", 'z', "#c");
        assert_eq!(msg.to_string(), ":irc.test 472 alice z :is unknown mode char to me for #c");
    }
}
