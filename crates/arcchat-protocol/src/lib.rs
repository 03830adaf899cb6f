//! Wire protocol for arcchat sessions.
//!
//! This crate defines what travels between a chat client and the server:
//!
//! - **Types** ([`ClientMessage`], [`ServerMessage`], [`PeerId`]): the
//!   message structures on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how messages become bytes.
//! - **Framing** ([`encode_frame`], [`FrameDecoder`]): how message bodies are
//!   delimited on a byte stream.
//! - **Errors** ([`ProtocolError`]): what can go wrong in any of the above.
//!
//! # Architecture
//!
//! ```text
//! TCP bytes → FrameDecoder (frames) → Codec (ServerMessage) → session layer
//! ```
//!
//! Nothing here touches sockets. The session crate owns the connection and
//! calls into this one to turn bytes into messages and back.

mod codec;
mod error;
mod frame;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use frame::{DEFAULT_MAX_FRAME_LEN, FrameDecoder, HEADER_LEN, encode_frame};
pub use types::{ClientMessage, PeerId, ServerMessage};
