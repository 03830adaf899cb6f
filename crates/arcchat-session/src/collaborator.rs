//! The operations a chat client needs from its networking collaborator.
//!
//! A dispatcher only ever talks to this trait, so it can be driven by the
//! real [`Connection`](crate::Connection) or by a recording mock in tests.
//!
//! Every operation takes the [`Registrar`] explicitly: opening a socket or
//! queueing output changes which descriptors the reactor must watch, and
//! there is no global registry to reach for.

use arcchat_protocol::PeerId;
use arcchat_reactor::Registrar;

use crate::{Channel, SessionError, SessionHandler};

/// Session and channel operations, plus the do-work entry point.
pub trait Collaborator {
    /// Starts a login, opening the connection first if needed.
    ///
    /// The result arrives later through [`SessionHandler::logged_in`] or
    /// [`SessionHandler::login_failed`].
    ///
    /// # Errors
    /// Fails without side effects if a session exists or a login is pending,
    /// or if the connection can't be opened.
    fn login<R: Registrar>(
        &mut self,
        registrar: &mut R,
        username: &str,
        password: &str,
    ) -> Result<(), SessionError>;

    /// Ends the session.
    ///
    /// A graceful logout asks the server and waits for its confirmation. A
    /// forced logout drops the connection at once and fires
    /// [`SessionHandler::disconnected`] before returning.
    fn logout<R: Registrar, H: SessionHandler>(
        &mut self,
        registrar: &mut R,
        handler: &mut H,
        force: bool,
    ) -> Result<(), SessionError>;

    /// Sends bytes directly to the server application.
    fn send_direct<R: Registrar>(
        &mut self,
        registrar: &mut R,
        data: &[u8],
    ) -> Result<(), SessionError>;

    /// Broadcasts bytes to every member of `channel`.
    fn channel_send_all<R: Registrar>(
        &mut self,
        registrar: &mut R,
        channel: &Channel,
        data: &[u8],
    ) -> Result<(), SessionError>;

    /// Sends bytes on `channel`, addressed to a single member.
    fn channel_send_one<R: Registrar>(
        &mut self,
        registrar: &mut R,
        channel: &Channel,
        data: &[u8],
        recipient: &PeerId,
    ) -> Result<(), SessionError>;

    /// Processes all pending I/O on the collaborator's descriptors once,
    /// firing callbacks on `handler` as messages are decoded.
    ///
    /// # Errors
    /// Returns the error that forced the connection closed.
    /// [`SessionHandler::disconnected`] has already fired by then.
    fn do_work<R: Registrar, H: SessionHandler>(
        &mut self,
        registrar: &mut R,
        handler: &mut H,
    ) -> Result<(), SessionError>;

    /// Releases every resource. No callbacks fire.
    fn shutdown<R: Registrar>(&mut self, registrar: &mut R);
}
