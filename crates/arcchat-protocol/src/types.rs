//! Message types for the arcchat wire format.
//!
//! Every type here is serialized into a frame body and sent over the
//! session connection. Client and server each have their own enum, so a
//! client can never accidentally decode one of its own requests as a reply.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// PeerId
// ---------------------------------------------------------------------------

/// An opaque byte identifier: a session id, a message sender, a recipient.
///
/// The server chooses the bytes. The client only ever compares them, prints
/// them as lowercase hex, and parses them back from hex typed by a user.
///
/// On the wire a `PeerId` is a hex string (`"deadbeef"`), via
/// `#[serde(try_from, into)]`. Deserialization goes through
/// [`PeerId::from_hex`], so the length limit holds for ids from the server
/// too.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PeerId(Vec<u8>);

impl PeerId {
    /// Longest id accepted, in bytes.
    pub const MAX_LEN: usize = 128;

    /// Wraps raw id bytes.
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Parses a hex-encoded id.
    ///
    /// Upper and lower case digits are both accepted.
    ///
    /// # Errors
    /// - [`ProtocolError::PeerIdTooLong`] if the id would exceed
    ///   [`Self::MAX_LEN`] bytes. Checked before decoding.
    /// - [`ProtocolError::InvalidPeerId`] on odd length or a non-hex digit.
    pub fn from_hex(hex: &str) -> Result<Self, ProtocolError> {
        let len = hex.len() / 2;
        if len > Self::MAX_LEN {
            return Err(ProtocolError::PeerIdTooLong {
                len,
                max: Self::MAX_LEN,
            });
        }
        Ok(Self(hex::decode(hex)?))
    }

    /// The raw id bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Lowercase hex rendering of the id.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl TryFrom<String> for PeerId {
    type Error = ProtocolError;

    fn try_from(hex: String) -> Result<Self, Self::Error> {
        Self::from_hex(&hex)
    }
}

impl From<PeerId> for String {
    fn from(id: PeerId) -> Self {
        id.to_hex()
    }
}

// ---------------------------------------------------------------------------
// ClientMessage
// ---------------------------------------------------------------------------

/// Messages a client sends to the server.
///
/// Internally tagged (`{"type": "LoginRequest", ...}`), like
/// [`ServerMessage`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// Authenticate and start a session.
    LoginRequest { username: String, password: String },

    /// End the session. The server answers with
    /// [`ServerMessage::LogoutSuccess`] and closes the connection.
    LogoutRequest,

    /// Opaque bytes for the server application itself.
    SessionMessage { data: Vec<u8> },

    /// Bytes for the members of a channel.
    ///
    /// An empty `recipients` list means every member.
    ChannelMessage {
        channel: String,
        recipients: Vec<PeerId>,
        data: Vec<u8>,
    },
}

// ---------------------------------------------------------------------------
// ServerMessage
// ---------------------------------------------------------------------------

/// Messages the server sends to a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    /// Login accepted. `reconnect_key` lets a dropped client resume.
    LoginSuccess {
        session_id: PeerId,
        reconnect_key: PeerId,
    },

    /// Login rejected, with a human-readable reason.
    LoginFailure { reason: String },

    /// A dropped session was resumed.
    ReconnectSuccess,

    /// The session ended at the client's request.
    LogoutSuccess,

    /// Opaque bytes from the server application.
    SessionMessage { data: Vec<u8> },

    /// The client is now a member of `channel`.
    ChannelJoin { channel: String },

    /// The client is no longer a member of `channel`.
    ChannelLeave { channel: String },

    /// Bytes received on a channel. `sender` is `None` when the server
    /// itself sent them.
    ChannelMessage {
        channel: String,
        sender: Option<PeerId>,
        data: Vec<u8>,
    },
}
