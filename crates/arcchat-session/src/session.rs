//! Session types: the handles and settings behind a client connection.
//!
//! A [`Session`] is the client's proof that the server accepted its login.
//! A [`Channel`] names a channel the server says the client belongs to.
//! Both are plain values; the [`Connection`](crate::Connection) keeps its own
//! copies, so an application can hold on to them freely.

use std::fmt;
use std::time::Duration;

use arcchat_protocol::{DEFAULT_MAX_FRAME_LEN, PeerId};

// ---------------------------------------------------------------------------
// ConnectionConfig
// ---------------------------------------------------------------------------

/// Where to connect and how big frames may get.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Server hostname or address.
    pub host: String,

    /// Server port.
    pub port: u16,

    /// Bound on the blocking TCP connect performed by `login`.
    pub connect_timeout: Duration,

    /// Largest frame body accepted or sent, in bytes.
    pub max_frame_len: usize,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 2502,
            connect_timeout: Duration::from_secs(5),
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
        }
    }
}

impl ConnectionConfig {
    /// `host:port`, for logs and error messages.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// ---------------------------------------------------------------------------
// ConnectionState
// ---------------------------------------------------------------------------

/// Where a connection is in its login lifecycle.
///
/// ```text
///   Idle ──(login)──→ Connecting ──(LoginSuccess)──→ LoggedIn
///    ↑                   │                              │
///    │            (LoginFailure)                  (logout)
///    │                   │                              ↓
///    └───────────────────┴──────(close)──────────── LoggingOut
/// ```
///
/// Any socket error or a forced logout goes straight back to `Idle`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    /// No login attempted, or the last session ended.
    Idle,

    /// Login request sent, waiting for the verdict.
    Connecting,

    /// The server accepted the login.
    LoggedIn(Session),

    /// A graceful logout was requested; waiting for the server to confirm.
    LoggingOut(Session),
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// An established session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    id: PeerId,
    reconnect_key: PeerId,
}

impl Session {
    /// Creates a session handle from the ids the server assigned.
    pub fn new(id: PeerId, reconnect_key: PeerId) -> Self {
        Self { id, reconnect_key }
    }

    /// The session's id, which other clients use to address it.
    pub fn id(&self) -> &PeerId {
        &self.id
    }

    /// Key the server issued for resuming a dropped session.
    pub fn reconnect_key(&self) -> &PeerId {
        &self.reconnect_key
    }
}

// ---------------------------------------------------------------------------
// Channel
// ---------------------------------------------------------------------------

/// A channel the client is a member of.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Channel {
    name: String,
}

impl Channel {
    /// Creates a handle for the channel called `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// The channel's unique name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
