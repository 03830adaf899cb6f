//! # arcchat
//!
//! Command-line chat client for channel-based game servers.
//!
//! The client reads commands from a line-oriented input, runs them against a
//! session collaborator, and prints what the server reports back. It is a
//! single-threaded reactor: one readiness wait per cycle covers both the
//! input and the collaborator's sockets.
//!
//! ## Layers
//!
//! - `arcchat-reactor`: descriptor registry, line buffer, event loop
//! - `arcchat-protocol`: wire messages and framing
//! - `arcchat-session`: the TCP collaborator and its callback trait
//! - this crate: command table, client state, console, configuration
//!
//! ## Running
//!
//! ```rust,no_run
//! use arcchat::ClientConfig;
//!
//! let code = arcchat::run(ClientConfig::default())?;
//! std::process::exit(code);
//! # Ok::<(), arcchat::ChatError>(())
//! ```

mod channels;
mod cli;
mod client;
pub mod commands;
mod config;
mod console;
mod error;

use std::io;

use arcchat_reactor::{EventLoop, FdReader, SelectPoller};
use arcchat_session::Connection;

pub use channels::ChannelMap;
pub use cli::Cli;
pub use client::{ChatClient, ChatState, GLOBAL_CHANNEL};
pub use config::ClientConfig;
pub use console::{Console, PROMPT};
pub use error::{ChatError, CommandError};

/// Runs an interactive client on stdin and stdout until `quit` or end of
/// input.
///
/// Returns the exit status.
///
/// # Errors
/// Fails before the loop starts if the connection settings are unusable.
pub fn run(config: ClientConfig) -> Result<i32, ChatError> {
    let connection = Connection::new(config.connection_config())?;
    let mut client =
        ChatClient::new(connection, io::stdout()).with_prompts(config.prompts);

    let mut event_loop = EventLoop::new(
        config.reactor_config(),
        SelectPoller::new(),
        libc::STDIN_FILENO,
        FdReader::stdin(),
    );
    Ok(event_loop.run(&mut client))
}

/// Common imports for driving a client from code.
pub mod prelude {
    pub use crate::{ChatClient, ChatError, ClientConfig, CommandError};
    pub use arcchat_reactor::{DescriptorRegistry, Driver, EventLoop, Registrar};
    pub use arcchat_session::{Channel, Collaborator, Session, SessionHandler};
}
