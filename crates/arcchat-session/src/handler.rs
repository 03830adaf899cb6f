use arcchat_protocol::PeerId;

use crate::{Channel, Session};

/// Callbacks a collaborator fires while doing work.
///
/// They run synchronously on the reactor thread, in the middle of
/// [`Collaborator::do_work`](crate::Collaborator::do_work) (or a forced
/// logout). They receive everything they need as arguments and must not
/// block.
pub trait SessionHandler {
    /// The server accepted the login.
    fn logged_in(&mut self, session: &Session);

    /// The server rejected the login.
    fn login_failed(&mut self, reason: &str);

    /// A dropped session was resumed.
    fn reconnected(&mut self);

    /// The connection is gone. Any session handle is now stale.
    fn disconnected(&mut self);

    /// The server added the client to `channel`.
    fn channel_joined(&mut self, channel: &Channel);

    /// The server removed the client from `channel`.
    fn channel_left(&mut self, channel: &Channel);

    /// Bytes arrived on `channel`. `sender` is `None` for server messages.
    fn channel_message(
        &mut self,
        channel: &Channel,
        sender: Option<&PeerId>,
        data: &[u8],
    );

    /// Bytes arrived directly from the server.
    fn session_message(&mut self, data: &[u8]);
}
