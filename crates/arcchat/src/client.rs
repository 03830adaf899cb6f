//! The chat client: local state, callbacks, and command execution.
//!
//! [`ChatClient`] is the reactor's [`Driver`]. It owns the collaborator and
//! a [`ChatState`], which is the collaborator's [`SessionHandler`]. The two
//! are separate fields so the client can lend the state to the collaborator
//! while calling it:
//!
//! ```text
//! EventLoop ──handle_line──→ ChatClient ──login/send──→ Collaborator
//!     │                          │                          │
//!     └──────do_work──────→ ChatClient ──do_work(&mut state)┘
//!                                                           │
//!                      ChatState ←──── callbacks ───────────┘
//! ```
//!
//! Nothing here is global; a process could run several clients side by side.

use std::io::Write;
use std::ops::ControlFlow;

use arcchat_protocol::PeerId;
use arcchat_reactor::{DescriptorRegistry, Driver, ReactorError, Registrar};
use arcchat_session::{Channel, Collaborator, Session, SessionHandler};

use crate::commands::{self, COMMANDS, Command, CommandSpec};
use crate::{ChannelMap, CommandError, Console};

/// The channel private messages are addressed on.
pub const GLOBAL_CHANNEL: &str = "-GLOBAL-";

/// Everything the callbacks touch.
pub struct ChatState<W: Write> {
    console: Console<W>,
    session: Option<Session>,
    channels: ChannelMap,
}

impl<W: Write> ChatState<W> {
    pub fn new(out: W) -> Self {
        Self {
            console: Console::new(out),
            session: None,
            channels: ChannelMap::new(),
        }
    }

    /// The session from the last successful login, until disconnect.
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn channels(&self) -> &ChannelMap {
        &self.channels
    }

    pub fn console(&self) -> &Console<W> {
        &self.console
    }

    fn callback(&mut self, text: impl std::fmt::Display) {
        self.console.line(format_args!(" - Callback -   {text}"));
    }
}

impl<W: Write> SessionHandler for ChatState<W> {
    fn logged_in(&mut self, session: &Session) {
        self.callback(format_args!("Logged in with sessionId {}.", session.id()));
        self.session = Some(session.clone());
    }

    fn login_failed(&mut self, reason: &str) {
        self.callback(format_args!("Login failed ({reason})"));
    }

    fn reconnected(&mut self) {
        self.callback("Reconnected.");
    }

    fn disconnected(&mut self) {
        self.callback("Disconnected.");
        self.session = None;
        // Channel handles die with the connection.
        self.channels.clear();
    }

    fn channel_joined(&mut self, channel: &Channel) {
        self.callback(format_args!("Joined channel: {channel}"));
        if !self.channels.join(channel) {
            self.console.line(format_args!(
                "Warning: client thought it was already a member of channel {channel}"
            ));
        }
    }

    fn channel_left(&mut self, channel: &Channel) {
        self.callback(format_args!("Left channel: {channel}"));
        if self.channels.leave(channel.name()).is_none() {
            self.console.line(format_args!(
                "Warning: client did not think it was a member of channel {channel}"
            ));
        }
    }

    fn channel_message(
        &mut self,
        channel: &Channel,
        sender: Option<&PeerId>,
        data: &[u8],
    ) {
        let sender = sender.map_or_else(|| "Server".to_string(), PeerId::to_hex);
        self.callback(format_args!(
            "Received message on channel {channel} from {sender}: {}",
            String::from_utf8_lossy(data)
        ));
    }

    fn session_message(&mut self, data: &[u8]) {
        self.callback(format_args!(
            "Received message: {}",
            String::from_utf8_lossy(data)
        ));
    }
}

/// A console chat client driving collaborator `C` and writing to `W`.
pub struct ChatClient<C, W: Write> {
    connection: C,
    state: ChatState<W>,
    prompts: bool,
}

impl<C: Collaborator, W: Write> ChatClient<C, W> {
    pub fn new(connection: C, out: W) -> Self {
        Self {
            connection,
            state: ChatState::new(out),
            prompts: true,
        }
    }

    /// Turns the `Command: ` prompt on or off.
    pub fn with_prompts(mut self, prompts: bool) -> Self {
        self.prompts = prompts;
        self
    }

    pub fn connection(&self) -> &C {
        &self.connection
    }

    pub fn state(&self) -> &ChatState<W> {
        &self.state
    }

    /// Mutable access to the callback state, e.g. to replay callbacks.
    pub fn state_mut(&mut self) -> &mut ChatState<W> {
        &mut self.state
    }

    /// Parses and runs one input line.
    ///
    /// Failures are printed and never stop the client. Returns `Break` only
    /// for `quit`.
    pub fn dispatch<R: Registrar>(
        &mut self,
        line: &str,
        registrar: &mut R,
    ) -> ControlFlow<i32> {
        let (word, args) = commands::split_first_word(line.trim_end());
        if word.is_empty() {
            return ControlFlow::Continue(());
        }

        let Some(entry) = commands::lookup(word) else {
            tracing::debug!(word, "unrecognized command");
            self.state.console.line(CommandError::Unrecognized);
            return ControlFlow::Continue(());
        };

        match self.run(entry, args, registrar) {
            Ok(flow) => flow,
            Err(e) => {
                tracing::debug!(command = entry.name, error = %e, "command failed");
                self.state.console.line(e);
                ControlFlow::Continue(())
            }
        }
    }

    fn run<R: Registrar>(
        &mut self,
        entry: &CommandSpec,
        args: &str,
        registrar: &mut R,
    ) -> Result<ControlFlow<i32>, CommandError> {
        if entry.requires_session && self.state.session.is_none() {
            return Err(CommandError::NotLoggedIn);
        }
        let command = entry.parse(args)?;
        self.execute(command, registrar)
    }

    fn execute<R: Registrar>(
        &mut self,
        command: Command,
        registrar: &mut R,
    ) -> Result<ControlFlow<i32>, CommandError> {
        let conn = &mut self.connection;
        match command {
            Command::Help => {
                self.state.console.line("Available commands:");
                for entry in COMMANDS {
                    self.state.console.line(entry.help_line());
                }
                self.state.console.line("");
            }
            Command::Quit => return Ok(ControlFlow::Break(0)),
            Command::Login { username, password } => {
                conn.login(registrar, &username, &password)
                    .map_err(failed("login"))?;
            }
            Command::Logout { force } => {
                conn.logout(registrar, &mut self.state, force)
                    .map_err(failed("logout"))?;
            }
            Command::SrvSend(message) => {
                conn.send_direct(registrar, message.as_bytes())
                    .map_err(failed("direct send"))?;
            }
            Command::PrivateSend { recipient, message } => {
                let global = self
                    .state
                    .channels
                    .get(GLOBAL_CHANNEL)
                    .ok_or(CommandError::NoGlobalChannel)?;
                let payload = format!("/pm {message}");
                conn.channel_send_one(
                    registrar,
                    global,
                    payload.as_bytes(),
                    &recipient,
                )
                .map_err(failed("channel send"))?;
            }
            Command::ChSend { channel, message } => {
                let target = self
                    .state
                    .channels
                    .get(&channel)
                    .ok_or_else(|| CommandError::UnknownChannel(channel.clone()))?;
                conn.channel_send_all(registrar, target, message.as_bytes())
                    .map_err(failed("channel send"))?;
            }
            Command::ChJoin(name) => {
                conn.send_direct(registrar, format!("/join {name}").as_bytes())
                    .map_err(failed("direct send"))?;
            }
            Command::ChLeave(name) => {
                conn.send_direct(registrar, format!("/leave {name}").as_bytes())
                    .map_err(failed("direct send"))?;
            }
        }
        Ok(ControlFlow::Continue(()))
    }
}

fn failed(
    op: &'static str,
) -> impl FnOnce(arcchat_session::SessionError) -> CommandError {
    move |source| CommandError::Collaborator { op, source }
}

impl<C: Collaborator, W: Write> Driver for ChatClient<C, W> {
    fn handle_line(
        &mut self,
        line: &str,
        registry: &mut DescriptorRegistry,
    ) -> ControlFlow<i32> {
        self.dispatch(line, registry)
    }

    fn do_work(&mut self, registry: &mut DescriptorRegistry) {
        if let Err(e) = self.connection.do_work(registry, &mut self.state) {
            tracing::warn!(error = %e, "collaborator work failed");
            self.state.console.line(failed("do_work")(e));
        }
    }

    fn shutdown(&mut self, registry: &mut DescriptorRegistry) {
        self.connection.shutdown(registry);
        self.state.channels.clear();
        self.state.session = None;
        tracing::debug!("client shut down");
    }

    fn prompt(&mut self) {
        if self.prompts {
            self.state.console.prompt();
        }
    }

    fn report(&mut self, error: &ReactorError) {
        self.state.console.line(format_args!("Error: {error}"));
    }
}
