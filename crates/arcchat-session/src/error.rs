//! Error types for the session layer.

use std::io;

use arcchat_protocol::ProtocolError;

/// Errors returned by collaborator operations.
///
/// All of them leave the connection in a consistent state: an operation
/// either queues its whole request or changes nothing.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// There is no open connection to the server.
    #[error("not connected")]
    NotConnected,

    /// The operation needs an established session.
    #[error("not logged in")]
    NotLoggedIn,

    /// A session is already established (or is being torn down).
    #[error("already logged in")]
    AlreadyLoggedIn,

    /// A login request is already waiting for the server's answer.
    #[error("login already in progress")]
    LoginInProgress,

    /// The server never confirmed membership of this channel.
    #[error("not a member of channel {0}")]
    UnknownChannel(String),

    /// The connection settings can't work.
    #[error("invalid connection config: {0}")]
    InvalidConfig(String),

    /// Opening the TCP connection failed.
    #[error("could not connect to {addr}: {source}")]
    Connect {
        /// The `host:port` that was tried.
        addr: String,
        /// The last error seen.
        #[source]
        source: io::Error,
    },

    /// Reading or writing the socket failed. The connection has been closed.
    #[error("connection I/O failed: {0}")]
    Io(#[from] io::Error),

    /// Encoding, framing, or decoding failed.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}
