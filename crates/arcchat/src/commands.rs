//! The command table and argument parsing.
//!
//! Every command the console understands is one [`CommandSpec`] row in
//! [`COMMANDS`]. A row says what the command is called, how to use it,
//! whether it needs a session, and how to turn its arguments into a
//! [`Command`]. Parsing never touches the network or local state; the
//! [`ChatClient`](crate::ChatClient) executes the result.

use arcchat_protocol::{PeerId, ProtocolError};

use crate::CommandError;

/// A fully parsed command, ready to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Quit,
    Login { username: String, password: String },
    Logout { force: bool },
    SrvSend(String),
    PrivateSend { recipient: PeerId, message: String },
    ChSend { channel: String, message: String },
    ChJoin(String),
    ChLeave(String),
}

/// One row of the command table.
pub struct CommandSpec {
    /// The primary name.
    pub name: &'static str,
    /// Other names that run the same command.
    pub aliases: &'static [&'static str],
    /// Shown in the help list and after `Invalid command.  Syntax:`.
    pub usage: &'static str,
    /// One-line description for the help list.
    pub summary: &'static str,
    /// Whether the command needs an established session.
    pub requires_session: bool,
    parse: fn(&'static str, &str) -> Result<Command, CommandError>,
}

impl CommandSpec {
    /// Parses the text after the command word.
    ///
    /// # Errors
    /// Returns a [`CommandError`] describing the first problem found.
    pub fn parse(&self, args: &str) -> Result<Command, CommandError> {
        (self.parse)(self.usage, args)
    }

    /// Whether `word` names this command.
    pub fn matches(&self, word: &str) -> bool {
        self.name == word || self.aliases.contains(&word)
    }

    /// This command's line in the help list.
    pub fn help_line(&self) -> String {
        match self.aliases {
            [] => format!("  {}: {}", self.usage, self.summary),
            aliases => format!(
                "  {}: {} (alias: {})",
                self.usage,
                self.summary,
                aliases.join(", ")
            ),
        }
    }
}

/// Every command, in help order.
pub static COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        name: "help",
        aliases: &[],
        usage: "help",
        summary: "lists the available commands",
        requires_session: false,
        parse: |_, _| Ok(Command::Help),
    },
    CommandSpec {
        name: "quit",
        aliases: &["exit"],
        usage: "quit",
        summary: "terminates the program",
        requires_session: false,
        parse: |_, _| Ok(Command::Quit),
    },
    CommandSpec {
        name: "login",
        aliases: &[],
        usage: "login <username> <password>",
        summary: "log into the server",
        requires_session: false,
        parse: parse_login,
    },
    CommandSpec {
        name: "logout",
        aliases: &[],
        usage: "logout",
        summary: "log out from the server (cleanly)",
        requires_session: true,
        parse: |_, _| Ok(Command::Logout { force: false }),
    },
    CommandSpec {
        name: "logoutf",
        aliases: &[],
        usage: "logoutf",
        summary: "log out from the server (forcibly)",
        requires_session: true,
        parse: |_, _| Ok(Command::Logout { force: true }),
    },
    CommandSpec {
        name: "srvsend",
        aliases: &[],
        usage: "srvsend <msg>",
        summary: "send a message directly to the server (not normally necessary)",
        requires_session: true,
        parse: |usage, args| {
            required(args, usage).map(|msg| Command::SrvSend(msg.to_string()))
        },
    },
    CommandSpec {
        name: "psend",
        aliases: &["pm"],
        usage: "psend <user-id> <msg>",
        summary: "send a private message to a user",
        requires_session: true,
        parse: parse_private_send,
    },
    CommandSpec {
        name: "chsend",
        aliases: &[],
        usage: "chsend <channel-name> <msg>",
        summary: "broadcast a message on a channel",
        requires_session: true,
        parse: |usage, args| {
            let (channel, message) = split_first_word(args);
            let channel = required(channel, usage)?;
            let message = required(message, usage)?;
            Ok(Command::ChSend {
                channel: channel.to_string(),
                message: message.to_string(),
            })
        },
    },
    CommandSpec {
        name: "chjoin",
        aliases: &["join"],
        usage: "chjoin <channel-name>",
        summary: "join a channel",
        requires_session: true,
        parse: |usage, args| {
            required(args, usage).map(|name| Command::ChJoin(name.to_string()))
        },
    },
    CommandSpec {
        name: "chleave",
        aliases: &["leave"],
        usage: "chleave <channel-name>",
        summary: "leave a channel",
        requires_session: true,
        parse: |usage, args| {
            required(args, usage).map(|name| Command::ChLeave(name.to_string()))
        },
    },
];

/// Finds the table row for a command word. Case-sensitive.
pub fn lookup(word: &str) -> Option<&'static CommandSpec> {
    COMMANDS.iter().find(|entry| entry.matches(word))
}

/// Splits off the first whitespace-delimited word.
///
/// Leading whitespace is skipped on both halves; the remainder keeps its
/// inner spacing.
pub fn split_first_word(text: &str) -> (&str, &str) {
    let text = text.trim_start();
    match text.find(char::is_whitespace) {
        Some(at) => (&text[..at], text[at..].trim_start()),
        None => (text, ""),
    }
}

fn required<'a>(
    arg: &'a str,
    usage: &'static str,
) -> Result<&'a str, CommandError> {
    if arg.is_empty() {
        Err(CommandError::Usage(usage))
    } else {
        Ok(arg)
    }
}

fn parse_login(usage: &'static str, args: &str) -> Result<Command, CommandError> {
    let mut words = args.split_whitespace();
    match (words.next(), words.next(), words.next()) {
        (Some(username), Some(password), None) => Ok(Command::Login {
            username: username.to_string(),
            password: password.to_string(),
        }),
        _ => Err(CommandError::Usage(usage)),
    }
}

fn parse_private_send(
    usage: &'static str,
    args: &str,
) -> Result<Command, CommandError> {
    let (token, message) = split_first_word(args);
    let token = required(token, usage)?;

    let recipient = PeerId::from_hex(token).map_err(|e| match e {
        ProtocolError::PeerIdTooLong { .. } => CommandError::RecipientTooLong,
        _ => CommandError::InvalidRecipient {
            token: token.to_string(),
        },
    })?;

    let message = required(message, usage)?;
    Ok(Command::PrivateSend {
        recipient,
        message: message.to_string(),
    })
}
