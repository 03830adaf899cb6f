//! Error types for the chat client.

use arcchat_protocol::ProtocolError;
use arcchat_reactor::ReactorError;
use arcchat_session::SessionError;

/// A command that could not be carried out.
///
/// The `Display` text of each variant is exactly what the user sees on the
/// console. None of them is fatal, and none leaves local state changed.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// The arguments don't match the command's shape.
    #[error("Invalid command.  Syntax: {0}")]
    Usage(&'static str),

    /// The command needs a session and there isn't one.
    #[error("Error: not logged in!")]
    NotLoggedIn,

    /// No command of that name or alias exists.
    #[error("Unrecognized command.  Try \"help\"")]
    Unrecognized,

    /// The recipient id isn't valid hex.
    #[error("Error: invalid recipient ID ({token}).")]
    InvalidRecipient {
        /// The token as typed.
        token: String,
    },

    /// The recipient id decodes to more bytes than a peer id may hold.
    #[error("Error: ran out of buffer space (recipient ID too big).")]
    RecipientTooLong,

    /// Private messages travel on the global channel, which isn't joined.
    #[error("Error: could not find global channel in channel map.")]
    NoGlobalChannel,

    /// The named channel isn't in the channel map.
    #[error("Error: Channel \"{0}\" not found.")]
    UnknownChannel(String),

    /// The collaborator refused or failed the operation.
    #[error("Error in {op}: {source}")]
    Collaborator {
        /// The collaborator operation that failed.
        op: &'static str,
        /// Why it failed.
        #[source]
        source: SessionError,
    },
}

/// Top-level error that wraps every layer's errors.
///
/// The `#[from]` attributes let `?` lift a layer's error into this one.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    /// The event loop failed to wait or read.
    #[error(transparent)]
    Reactor(#[from] ReactorError),

    /// Encoding, framing, or peer id parsing failed.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The session connection failed.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A user command failed.
    #[error(transparent)]
    Command(#[from] CommandError),
}
