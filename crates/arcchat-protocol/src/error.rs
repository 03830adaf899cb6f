//! Error types for the protocol layer.
//!
//! Each arcchat crate defines its own error enum. A `ProtocolError` always
//! means the bytes or ids were wrong, never that a socket failed.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serializing a message failed.
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserializing a message failed: malformed JSON, an unknown `type`
    /// tag, or missing fields.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// A frame is larger than the configured limit.
    ///
    /// Raised before any allocation sized from the length header, and for
    /// outgoing frames before anything is queued.
    #[error("frame of {len} bytes exceeds limit of {max}")]
    FrameTooLarge {
        /// Length of the offending frame body.
        len: usize,
        /// Configured maximum body length.
        max: usize,
    },

    /// A hex peer id could not be decoded (odd length or non-hex digit).
    #[error("invalid peer id: {0}")]
    InvalidPeerId(#[from] hex::FromHexError),

    /// A peer id is longer than [`PeerId::MAX_LEN`](crate::PeerId::MAX_LEN).
    #[error("peer id of {len} bytes exceeds limit of {max}")]
    PeerIdTooLong {
        /// Decoded length in bytes.
        len: usize,
        /// Maximum length in bytes.
        max: usize,
    },
}
