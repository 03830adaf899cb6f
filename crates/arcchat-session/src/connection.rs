//! The connection: one TCP socket, one login, many channels.
//!
//! This is the central piece of the session layer. It is responsible for:
//! - Opening the socket on the first login and registering it for readiness
//! - Queueing outgoing frames and watching for `WRITABLE` only while
//!   bytes are waiting
//! - Reading, deframing, and decoding everything the server sent
//! - Tracking login state and channel membership, and firing callbacks
//!
//! # Concurrency note
//!
//! `Connection` is not thread-safe and doesn't need to be: it is owned by the
//! client on the reactor thread, and every callback it fires runs on that
//! same thread before `do_work` returns.

use std::collections::HashMap;
use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::os::fd::{AsRawFd, RawFd};

use arcchat_protocol::{
    ClientMessage, Codec, FrameDecoder, JsonCodec, PeerId, ServerMessage,
    encode_frame,
};
use arcchat_reactor::{Interest, Registrar};

use crate::{
    Channel, Collaborator, ConnectionConfig, ConnectionState, Session,
    SessionError, SessionHandler,
};

/// Bytes pulled from the socket per `read` call.
const READ_CHUNK: usize = 4096;

/// Socket reads per `do_work` call. Whatever is left stays readable and is
/// picked up on the next cycle.
const MAX_READS_PER_WORK: usize = 16;

/// A client connection to a chat server.
///
/// ## Lifecycle
///
/// ```text
/// login() ──→ connect + register ──→ do_work()* ──→ close + unregister
///                                        │
///                                        ▼
///                         callbacks on the SessionHandler
/// ```
///
/// The socket is opened lazily by [`login`](Collaborator::login) and closed
/// on logout, on any I/O error, or when the server hangs up. Every close
/// unregisters every class it registered.
pub struct Connection<C: Codec = JsonCodec> {
    config: ConnectionConfig,
    codec: C,
    stream: Option<TcpStream>,
    state: ConnectionState,

    /// Encoded frames not yet written to the socket.
    outbound: Vec<u8>,

    decoder: FrameDecoder,

    /// Classes currently registered for the socket.
    ///
    /// Kept so interest changes are sent to the registrar as deltas.
    interest: Interest,

    /// Channels the server has confirmed, keyed by name.
    channels: HashMap<String, Channel>,
}

impl Connection<JsonCodec> {
    /// Creates an idle connection using the JSON codec.
    ///
    /// # Errors
    /// Returns [`SessionError::InvalidConfig`] for an empty host or a frame
    /// limit that is zero or doesn't fit the 32-bit length header.
    pub fn new(config: ConnectionConfig) -> Result<Self, SessionError> {
        Self::with_codec(config, JsonCodec)
    }
}

impl<C: Codec> Connection<C> {
    /// Creates an idle connection using a custom codec.
    ///
    /// # Errors
    /// Same as [`Connection::new`].
    pub fn with_codec(
        config: ConnectionConfig,
        codec: C,
    ) -> Result<Self, SessionError> {
        if config.host.is_empty() {
            return Err(SessionError::InvalidConfig("host is empty".into()));
        }
        if config.max_frame_len == 0
            || config.max_frame_len > u32::MAX as usize
        {
            return Err(SessionError::InvalidConfig(format!(
                "max_frame_len {} out of range",
                config.max_frame_len
            )));
        }

        Ok(Self {
            decoder: FrameDecoder::new(config.max_frame_len),
            config,
            codec,
            stream: None,
            state: ConnectionState::Idle,
            outbound: Vec::new(),
            interest: Interest::empty(),
            channels: HashMap::new(),
        })
    }

    /// Current login state.
    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    /// The established session, if any (including one being logged out).
    pub fn session(&self) -> Option<&Session> {
        match &self.state {
            ConnectionState::LoggedIn(session)
            | ConnectionState::LoggingOut(session) => Some(session),
            ConnectionState::Idle | ConnectionState::Connecting => None,
        }
    }

    /// Returns `true` while the socket is open.
    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    /// The socket's descriptor, while open.
    pub fn fd(&self) -> Option<RawFd> {
        self.stream.as_ref().map(AsRawFd::as_raw_fd)
    }

    /// Looks up a confirmed channel by name.
    pub fn channel(&self, name: &str) -> Option<&Channel> {
        self.channels.get(name)
    }

    /// Bytes queued but not yet written.
    pub fn pending_output(&self) -> usize {
        self.outbound.len()
    }

    // -- Socket management ------------------------------------------------

    fn connect<R: Registrar>(
        &mut self,
        registrar: &mut R,
    ) -> Result<(), SessionError> {
        let addr = self.config.addr();
        let candidates = (self.config.host.as_str(), self.config.port)
            .to_socket_addrs()
            .map_err(|source| SessionError::Connect {
                addr: addr.clone(),
                source,
            })?;

        let mut last_err = None;
        let mut stream = None;
        for candidate in candidates {
            match TcpStream::connect_timeout(
                &candidate,
                self.config.connect_timeout,
            ) {
                Ok(s) => {
                    stream = Some(s);
                    break;
                }
                Err(e) => {
                    tracing::debug!(%candidate, error = %e, "connect attempt failed");
                    last_err = Some(e);
                }
            }
        }

        let stream = stream.ok_or_else(|| SessionError::Connect {
            addr: addr.clone(),
            source: last_err.unwrap_or_else(|| {
                io::Error::new(
                    io::ErrorKind::NotFound,
                    "host resolved to no addresses",
                )
            }),
        })?;

        stream.set_nodelay(true)?;
        stream.set_nonblocking(true)?;

        tracing::info!(%addr, fd = stream.as_raw_fd(), "connected");
        self.stream = Some(stream);
        self.set_interest(registrar, Interest::READABLE | Interest::ERROR);
        Ok(())
    }

    /// Moves the registered interest to `wanted`, sending only the delta.
    fn set_interest<R: Registrar>(&mut self, registrar: &mut R, wanted: Interest) {
        let Some(fd) = self.fd() else {
            self.interest = Interest::empty();
            return;
        };

        let added = wanted - self.interest;
        let removed = self.interest - wanted;
        if !added.is_empty() {
            registrar.interest_added(fd, added);
        }
        if !removed.is_empty() {
            registrar.interest_removed(fd, removed);
        }
        self.interest = wanted;
    }

    /// Closes the socket and forgets everything tied to it. No callbacks.
    fn close<R: Registrar>(&mut self, registrar: &mut R) {
        self.set_interest(registrar, Interest::empty());
        if let Some(stream) = self.stream.take() {
            let _ = stream.shutdown(Shutdown::Both);
            tracing::debug!("connection closed");
        }
        self.outbound.clear();
        self.decoder.clear();
        self.channels.clear();
        self.state = ConnectionState::Idle;
    }

    /// Closes after an unexpected loss and tells the handler.
    fn drop_connection<R: Registrar, H: SessionHandler>(
        &mut self,
        registrar: &mut R,
        handler: &mut H,
    ) {
        self.close(registrar);
        handler.disconnected();
    }

    // -- Output -----------------------------------------------------------

    /// Encodes and frames `msg`, then queues it. Nothing is queued on error.
    fn queue<R: Registrar>(
        &mut self,
        registrar: &mut R,
        msg: &ClientMessage,
    ) -> Result<(), SessionError> {
        let body = self.codec.encode(msg)?;
        let frame = encode_frame(&body, self.config.max_frame_len)?;
        self.outbound.extend_from_slice(&frame);
        self.set_interest(registrar, self.interest | Interest::WRITABLE);
        Ok(())
    }

    /// Writes as much queued output as the socket takes right now.
    fn flush(&mut self) -> io::Result<()> {
        let Some(stream) = self.stream.as_mut() else {
            return Ok(());
        };

        while !self.outbound.is_empty() {
            match stream.write(&self.outbound) {
                Ok(0) => return Err(io::ErrorKind::WriteZero.into()),
                Ok(n) => {
                    self.outbound.drain(..n);
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    // -- Input ------------------------------------------------------------

    /// Reads what is available into the decoder, at most
    /// `MAX_READS_PER_WORK` chunks.
    ///
    /// Returns `true` once the server has closed its end.
    fn fill(&mut self) -> io::Result<bool> {
        let Some(stream) = self.stream.as_mut() else {
            return Ok(true);
        };

        let mut chunk = [0u8; READ_CHUNK];
        for _ in 0..MAX_READS_PER_WORK {
            match stream.read(&mut chunk) {
                Ok(0) => return Ok(true),
                Ok(n) => self.decoder.extend(&chunk[..n]),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    return Ok(false);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        tracing::trace!("read budget spent, resuming next cycle");
        Ok(false)
    }

    fn handle_message<R: Registrar, H: SessionHandler>(
        &mut self,
        registrar: &mut R,
        handler: &mut H,
        msg: ServerMessage,
    ) {
        match msg {
            ServerMessage::LoginSuccess {
                session_id,
                reconnect_key,
            } => {
                let session = Session::new(session_id, reconnect_key);
                tracing::info!(session_id = %session.id(), "logged in");
                self.state = ConnectionState::LoggedIn(session.clone());
                handler.logged_in(&session);
            }
            ServerMessage::LoginFailure { reason } => {
                tracing::info!(%reason, "login rejected");
                self.close(registrar);
                handler.login_failed(&reason);
            }
            ServerMessage::ReconnectSuccess => {
                tracing::info!("session resumed");
                handler.reconnected();
            }
            ServerMessage::LogoutSuccess => {
                tracing::info!("logged out");
                self.drop_connection(registrar, handler);
            }
            ServerMessage::SessionMessage { data } => {
                handler.session_message(&data);
            }
            ServerMessage::ChannelJoin { channel } => {
                let channel = Channel::new(channel);
                tracing::debug!(%channel, "joined channel");
                self.channels
                    .insert(channel.name().to_string(), channel.clone());
                handler.channel_joined(&channel);
            }
            ServerMessage::ChannelLeave { channel } => {
                let channel = self
                    .channels
                    .remove(&channel)
                    .unwrap_or_else(|| Channel::new(channel));
                tracing::debug!(%channel, "left channel");
                handler.channel_left(&channel);
            }
            ServerMessage::ChannelMessage {
                channel,
                sender,
                data,
            } => {
                let channel = match self.channels.get(&channel) {
                    Some(known) => known.clone(),
                    None => {
                        tracing::warn!(%channel, "message on unjoined channel");
                        Channel::new(channel)
                    }
                };
                handler.channel_message(&channel, sender.as_ref(), &data);
            }
        }
    }

    fn require_session(&self) -> Result<(), SessionError> {
        match self.state {
            ConnectionState::LoggedIn(_) => Ok(()),
            _ => Err(SessionError::NotLoggedIn),
        }
    }

    fn require_channel(&self, channel: &Channel) -> Result<(), SessionError> {
        if self.channels.contains_key(channel.name()) {
            Ok(())
        } else {
            Err(SessionError::UnknownChannel(channel.name().to_string()))
        }
    }
}

impl<C: Codec> Collaborator for Connection<C> {
    fn login<R: Registrar>(
        &mut self,
        registrar: &mut R,
        username: &str,
        password: &str,
    ) -> Result<(), SessionError> {
        match self.state {
            ConnectionState::Idle => {}
            ConnectionState::Connecting => {
                return Err(SessionError::LoginInProgress);
            }
            ConnectionState::LoggedIn(_) | ConnectionState::LoggingOut(_) => {
                return Err(SessionError::AlreadyLoggedIn);
            }
        }

        if self.stream.is_none() {
            self.connect(registrar)?;
        }

        let request = ClientMessage::LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        if let Err(e) = self.queue(registrar, &request) {
            self.close(registrar);
            return Err(e);
        }

        tracing::debug!(username, "login requested");
        self.state = ConnectionState::Connecting;
        Ok(())
    }

    fn logout<R: Registrar, H: SessionHandler>(
        &mut self,
        registrar: &mut R,
        handler: &mut H,
        force: bool,
    ) -> Result<(), SessionError> {
        if self.stream.is_none() {
            return Err(SessionError::NotConnected);
        }

        if force {
            tracing::info!("forced logout");
            self.drop_connection(registrar, handler);
            return Ok(());
        }

        self.require_session()?;
        self.queue(registrar, &ClientMessage::LogoutRequest)?;
        if let ConnectionState::LoggedIn(session) = &self.state {
            self.state = ConnectionState::LoggingOut(session.clone());
        }
        Ok(())
    }

    fn send_direct<R: Registrar>(
        &mut self,
        registrar: &mut R,
        data: &[u8],
    ) -> Result<(), SessionError> {
        self.require_session()?;
        self.queue(
            registrar,
            &ClientMessage::SessionMessage {
                data: data.to_vec(),
            },
        )
    }

    fn channel_send_all<R: Registrar>(
        &mut self,
        registrar: &mut R,
        channel: &Channel,
        data: &[u8],
    ) -> Result<(), SessionError> {
        self.require_session()?;
        self.require_channel(channel)?;
        self.queue(
            registrar,
            &ClientMessage::ChannelMessage {
                channel: channel.name().to_string(),
                recipients: Vec::new(),
                data: data.to_vec(),
            },
        )
    }

    fn channel_send_one<R: Registrar>(
        &mut self,
        registrar: &mut R,
        channel: &Channel,
        data: &[u8],
        recipient: &PeerId,
    ) -> Result<(), SessionError> {
        self.require_session()?;
        self.require_channel(channel)?;
        self.queue(
            registrar,
            &ClientMessage::ChannelMessage {
                channel: channel.name().to_string(),
                recipients: vec![recipient.clone()],
                data: data.to_vec(),
            },
        )
    }

    fn do_work<R: Registrar, H: SessionHandler>(
        &mut self,
        registrar: &mut R,
        handler: &mut H,
    ) -> Result<(), SessionError> {
        if self.stream.is_none() {
            return Ok(());
        }

        if let Err(e) = self.flush() {
            tracing::warn!(error = %e, "write failed, dropping connection");
            self.drop_connection(registrar, handler);
            return Err(e.into());
        }
        if self.outbound.is_empty() {
            self.set_interest(registrar, self.interest - Interest::WRITABLE);
        }

        let eof = match self.fill() {
            Ok(eof) => eof,
            Err(e) => {
                tracing::warn!(error = %e, "read failed, dropping connection");
                self.drop_connection(registrar, handler);
                return Err(e.into());
            }
        };

        loop {
            let frame = match self.decoder.next_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!(error = %e, "bad frame, dropping connection");
                    self.drop_connection(registrar, handler);
                    return Err(e.into());
                }
            };

            match self.codec.decode::<ServerMessage>(&frame) {
                Ok(msg) => {
                    tracing::trace!(?msg, "received");
                    self.handle_message(registrar, handler, msg);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "skipping undecodable message");
                }
            }

            if self.stream.is_none() {
                return Ok(());
            }
        }

        if eof {
            tracing::info!("server closed the connection");
            self.drop_connection(registrar, handler);
        }
        Ok(())
    }

    fn shutdown<R: Registrar>(&mut self, registrar: &mut R) {
        if self.stream.is_some() {
            self.close(registrar);
        }
        tracing::debug!("connection shut down");
    }
}

// =========================================================================
// Tests
// =========================================================================
