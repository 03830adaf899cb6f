//! Session and channel connection for arcchat clients.
//!
//! This crate is the client's collaborator: it owns the socket, speaks the
//! wire protocol, and tells the application what happened through callbacks.
//!
//! 1. **Contract**: [`Collaborator`] is what a command dispatcher calls,
//!    [`SessionHandler`] is what the collaborator calls back.
//! 2. **Handles**: [`Session`] and [`Channel`] are cheap values the
//!    application keeps in its own state.
//! 3. **Implementation**: [`Connection`] speaks length-prefixed JSON over a
//!    non-blocking TCP socket and registers it with a
//!    [`Registrar`](arcchat_reactor::Registrar).
//!
//! # How it fits in the stack
//!
//! ```text
//! Chat client (above)  ← dispatches commands, keeps session + channel map
//!     ↕
//! Session layer (this crate)  ← socket, login state, channel table
//!     ↕
//! Protocol layer (below)  ← messages, framing, PeerId
//! ```
//!
//! Nothing here blocks except the initial TCP connect, which is bounded by
//! [`ConnectionConfig::connect_timeout`].

mod collaborator;
mod connection;
mod error;
mod handler;
mod session;

pub use collaborator::Collaborator;
pub use connection::Connection;
pub use error::SessionError;
pub use handler::SessionHandler;
pub use session::{Channel, ConnectionConfig, ConnectionState, Session};
