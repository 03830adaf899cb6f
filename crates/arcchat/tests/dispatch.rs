//! Integration tests for command dispatch against a recording collaborator.

use std::collections::VecDeque;
use std::io::{self, Read};
use std::ops::ControlFlow;
use std::os::fd::RawFd;
use std::time::Duration;

use arcchat::prelude::*;
use arcchat::{GLOBAL_CHANNEL, PROMPT};
use arcchat_protocol::PeerId;
use arcchat_reactor::{Interest, Poller, ReactorConfig, Readiness};
use arcchat_session::SessionError;

// =========================================================================
// Recording collaborator
// =========================================================================

const SOCKET_FD: RawFd = 42;

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Login(String, String),
    Logout(bool),
    Direct(Vec<u8>),
    SendAll(String, Vec<u8>),
    SendOne(String, Vec<u8>, PeerId),
    DoWork,
    Shutdown,
}

/// Records every call. Optionally refuses all of them.
#[derive(Default)]
struct MockCollaborator {
    calls: Vec<Call>,
    refuse: bool,
}

impl MockCollaborator {
    fn result(&self) -> Result<(), SessionError> {
        if self.refuse {
            Err(SessionError::NotConnected)
        } else {
            Ok(())
        }
    }
}

impl Collaborator for MockCollaborator {
    fn login<R: Registrar>(
        &mut self,
        registrar: &mut R,
        username: &str,
        password: &str,
    ) -> Result<(), SessionError> {
        self.calls
            .push(Call::Login(username.to_string(), password.to_string()));
        self.result()?;
        registrar.interest_added(SOCKET_FD, Interest::READABLE | Interest::ERROR);
        Ok(())
    }

    fn logout<R: Registrar, H: SessionHandler>(
        &mut self,
        registrar: &mut R,
        handler: &mut H,
        force: bool,
    ) -> Result<(), SessionError> {
        self.calls.push(Call::Logout(force));
        self.result()?;
        if force {
            registrar.interest_removed(SOCKET_FD, Interest::all());
            handler.disconnected();
        }
        Ok(())
    }

    fn send_direct<R: Registrar>(
        &mut self,
        _: &mut R,
        data: &[u8],
    ) -> Result<(), SessionError> {
        self.calls.push(Call::Direct(data.to_vec()));
        self.result()
    }

    fn channel_send_all<R: Registrar>(
        &mut self,
        _: &mut R,
        channel: &Channel,
        data: &[u8],
    ) -> Result<(), SessionError> {
        self.calls
            .push(Call::SendAll(channel.name().to_string(), data.to_vec()));
        self.result()
    }

    fn channel_send_one<R: Registrar>(
        &mut self,
        _: &mut R,
        channel: &Channel,
        data: &[u8],
        recipient: &PeerId,
    ) -> Result<(), SessionError> {
        self.calls.push(Call::SendOne(
            channel.name().to_string(),
            data.to_vec(),
            recipient.clone(),
        ));
        self.result()
    }

    fn do_work<R: Registrar, H: SessionHandler>(
        &mut self,
        _: &mut R,
        _: &mut H,
    ) -> Result<(), SessionError> {
        self.calls.push(Call::DoWork);
        Ok(())
    }

    fn shutdown<R: Registrar>(&mut self, registrar: &mut R) {
        self.calls.push(Call::Shutdown);
        registrar.interest_removed(SOCKET_FD, Interest::all());
    }
}

// =========================================================================
// Helpers
// =========================================================================

type Client = ChatClient<MockCollaborator, Vec<u8>>;

fn client() -> Client {
    ChatClient::new(MockCollaborator::default(), Vec::new()).with_prompts(false)
}

fn logged_in_client() -> Client {
    let mut client = client();
    client.state_mut().logged_in(&Session::new(
        PeerId::new(vec![0x01]),
        PeerId::new(vec![0x02]),
    ));
    client
}

fn calls(client: &Client) -> &[Call] {
    &client.connection().calls
}

/// Console output, minus the lines written during setup.
fn output(client: &Client) -> String {
    let raw = String::from_utf8(client.state().console().get_ref().clone())
        .unwrap();
    raw.lines()
        .filter(|l| !l.starts_with(" - Callback -   Logged in"))
        .map(|l| format!("{l}\n"))
        .collect()
}

fn run(client: &mut Client, reg: &mut DescriptorRegistry, line: &str) -> ControlFlow<i32> {
    client.dispatch(line, reg)
}

// =========================================================================
// Dispatch
// =========================================================================

#[test]
fn test_empty_line_does_nothing() {
    let mut client = client();
    let mut reg = DescriptorRegistry::new();

    assert_eq!(run(&mut client, &mut reg, ""), ControlFlow::Continue(()));
    assert_eq!(run(&mut client, &mut reg, "   "), ControlFlow::Continue(()));

    assert!(calls(&client).is_empty());
    assert_eq!(output(&client), "");
}

#[test]
fn test_unrecognized_command_is_not_fatal() {
    let mut client = client();
    let mut reg = DescriptorRegistry::new();

    assert_eq!(run(&mut client, &mut reg, "dance"), ControlFlow::Continue(()));

    assert_eq!(output(&client), "Unrecognized command.  Try \"help\"\n");
    assert!(calls(&client).is_empty());
}

#[test]
fn test_help_lists_every_command() {
    let mut client = client();
    let mut reg = DescriptorRegistry::new();

    run(&mut client, &mut reg, "help");

    let out = output(&client);
    assert!(out.starts_with("Available commands:\n"));
    for name in ["quit", "login", "logoutf", "srvsend", "psend", "chsend", "chjoin", "chleave"] {
        assert!(out.contains(&format!("  {name}")), "missing {name} in {out}");
    }
}

#[test]
fn test_quit_and_exit_break_with_zero() {
    let mut client = client();
    let mut reg = DescriptorRegistry::new();

    assert_eq!(run(&mut client, &mut reg, "quit"), ControlFlow::Break(0));
    assert_eq!(run(&mut client, &mut reg, "exit"), ControlFlow::Break(0));
}

#[test]
fn test_login_calls_collaborator_once() {
    let mut client = client();
    let mut reg = DescriptorRegistry::new();

    run(&mut client, &mut reg, "login alice secret");

    assert_eq!(
        calls(&client),
        &[Call::Login("alice".into(), "secret".into())]
    );
    assert!(reg.contains(SOCKET_FD));
}

#[test]
fn test_login_usage_error_has_no_side_effect() {
    let mut client = client();
    let mut reg = DescriptorRegistry::new();

    run(&mut client, &mut reg, "login alice");

    assert!(calls(&client).is_empty());
    assert_eq!(
        output(&client),
        "Invalid command.  Syntax: login <username> <password>\n"
    );
}

#[test]
fn test_collaborator_failure_is_printed() {
    let mut client = ChatClient::new(
        MockCollaborator {
            refuse: true,
            ..MockCollaborator::default()
        },
        Vec::new(),
    );
    let mut reg = DescriptorRegistry::new();

    run(&mut client, &mut reg, "login alice secret");

    assert_eq!(output(&client), "Error in login: not connected\n");
    assert!(reg.is_empty());
}

#[test]
fn test_session_commands_without_session_make_no_calls() {
    let mut client = client();
    let mut reg = DescriptorRegistry::new();

    let lines = [
        "logout",
        "logoutf",
        "srvsend hi",
        "psend DEADBEEF hello",
        "pm DEADBEEF hello",
        "chsend lobby hi",
        "chjoin lobby",
        "join lobby",
        "chleave lobby",
        "leave lobby",
        // Argument errors are not even looked at.
        "psend ZZ",
        "chjoin",
    ];
    for line in lines {
        run(&mut client, &mut reg, line);
    }

    assert!(calls(&client).is_empty());
    assert_eq!(output(&client), "Error: not logged in!\n".repeat(lines.len()));
}

#[test]
fn test_psend_sends_pm_on_global_channel() {
    let mut client = logged_in_client();
    client.state_mut().channel_joined(&Channel::new(GLOBAL_CHANNEL));
    let mut reg = DescriptorRegistry::new();

    run(&mut client, &mut reg, "psend DEADBEEF hello");

    assert_eq!(
        calls(&client),
        &[Call::SendOne(
            GLOBAL_CHANNEL.into(),
            b"/pm hello".to_vec(),
            PeerId::new(vec![0xde, 0xad, 0xbe, 0xef]),
        )]
    );
}

#[test]
fn test_psend_invalid_hex_sends_nothing() {
    let mut client = logged_in_client();
    client.state_mut().channel_joined(&Channel::new(GLOBAL_CHANNEL));
    let mut reg = DescriptorRegistry::new();

    run(&mut client, &mut reg, "psend ZZ hello");

    assert!(calls(&client).is_empty());
    assert!(output(&client).ends_with("Error: invalid recipient ID (ZZ).\n"));
}

#[test]
fn test_psend_without_global_channel_fails() {
    let mut client = logged_in_client();
    let mut reg = DescriptorRegistry::new();

    run(&mut client, &mut reg, "pm DEADBEEF hello");

    assert!(calls(&client).is_empty());
    assert_eq!(
        output(&client),
        "Error: could not find global channel in channel map.\n"
    );
}

#[test]
fn test_chsend_unjoined_channel_fails() {
    let mut client = logged_in_client();
    let mut reg = DescriptorRegistry::new();

    run(&mut client, &mut reg, "chsend lobby hi");

    assert!(calls(&client).is_empty());
    assert_eq!(output(&client), "Error: Channel \"lobby\" not found.\n");
}

#[test]
fn test_chsend_broadcasts_on_joined_channel() {
    let mut client = logged_in_client();
    client.state_mut().channel_joined(&Channel::new("lobby"));
    let mut reg = DescriptorRegistry::new();

    run(&mut client, &mut reg, "chsend lobby hi  all");

    assert_eq!(
        calls(&client),
        &[Call::SendAll("lobby".into(), b"hi  all".to_vec())]
    );
}

#[test]
fn test_srvsend_and_channel_requests_send_direct() {
    let mut client = logged_in_client();
    let mut reg = DescriptorRegistry::new();

    run(&mut client, &mut reg, "srvsend hello there");
    run(&mut client, &mut reg, "chjoin lobby");
    run(&mut client, &mut reg, "leave lobby");

    assert_eq!(
        calls(&client),
        &[
            Call::Direct(b"hello there".to_vec()),
            Call::Direct(b"/join lobby".to_vec()),
            Call::Direct(b"/leave lobby".to_vec()),
        ]
    );
}

#[test]
fn test_chjoin_then_callbacks_track_channel_map() {
    let mut client = logged_in_client();
    let mut reg = DescriptorRegistry::new();

    run(&mut client, &mut reg, "chjoin lobby");
    // The request alone doesn't change membership.
    assert!(client.state().channels().is_empty());

    client.state_mut().channel_joined(&Channel::new("lobby"));
    assert_eq!(client.state().channels().names(), vec!["lobby"]);

    client.state_mut().channel_left(&Channel::new("attic"));
    assert_eq!(client.state().channels().names(), vec!["lobby"]);

    client.state_mut().channel_left(&Channel::new("lobby"));
    assert!(client.state().channels().is_empty());
}

#[test]
fn test_forced_logout_clears_session() {
    let mut client = logged_in_client();
    let mut reg = DescriptorRegistry::new();
    reg.register(SOCKET_FD, Interest::READABLE);

    run(&mut client, &mut reg, "logoutf");

    assert_eq!(calls(&client), &[Call::Logout(true)]);
    assert!(client.state().session().is_none());
    assert!(reg.is_empty());

    run(&mut client, &mut reg, "srvsend hi");
    assert!(output(&client).ends_with("Error: not logged in!\n"));
}

// =========================================================================
// Through the event loop
// =========================================================================

const INPUT_FD: RawFd = 0;

/// Returns the queued readiness results in order, then timeouts.
struct ScriptedPoller {
    script: VecDeque<Readiness>,
}

impl Poller for ScriptedPoller {
    fn wait(
        &mut self,
        _: &DescriptorRegistry,
        _: Duration,
    ) -> io::Result<Readiness> {
        Ok(self.script.pop_front().unwrap_or_default())
    }
}

struct ChunkReader(VecDeque<&'static [u8]>);

impl Read for ChunkReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let Some(chunk) = self.0.pop_front() else {
            return Ok(0);
        };
        buf[..chunk.len()].copy_from_slice(chunk);
        Ok(chunk.len())
    }
}

fn input_ready() -> Readiness {
    [(INPUT_FD, Interest::READABLE)].into_iter().collect()
}

#[test]
fn test_quit_cleans_up_everything_once() {
    let mut client = ChatClient::new(MockCollaborator::default(), Vec::new());
    client.state_mut().channel_joined(&Channel::new(GLOBAL_CHANNEL));

    let poller = ScriptedPoller {
        script: VecDeque::from([
            input_ready(),
            input_ready(),
            [(SOCKET_FD, Interest::READABLE)].into_iter().collect(),
            input_ready(),
        ]),
    };
    let reader = ChunkReader(VecDeque::from([
        &b"login alice se"[..],
        &b"cret\nqu"[..],
        &b"it\n"[..],
    ]));
    let mut event_loop =
        EventLoop::new(ReactorConfig::default(), poller, INPUT_FD, reader);

    let code = event_loop.run(&mut client);

    assert_eq!(code, 0);
    assert!(event_loop.registry().is_empty());
    assert!(client.state().channels().is_empty());
    assert_eq!(
        calls(&client),
        &[
            Call::Login("alice".into(), "secret".into()),
            Call::DoWork,
            Call::Shutdown,
        ]
    );

    let console = String::from_utf8(client.state().console().get_ref().clone())
        .unwrap();
    assert!(console.starts_with(PROMPT));
}

#[test]
fn test_end_of_input_exits_cleanly() {
    let mut client = client();
    let poller = ScriptedPoller {
        script: VecDeque::from([input_ready()]),
    };
    let reader = ChunkReader(VecDeque::new());
    let mut event_loop =
        EventLoop::new(ReactorConfig::default(), poller, INPUT_FD, reader);

    assert_eq!(event_loop.run(&mut client), 0);
    assert_eq!(calls(&client), &[Call::Shutdown]);
}
