//! Client configuration.

use std::time::Duration;

use arcchat_protocol::DEFAULT_MAX_FRAME_LEN;
use arcchat_reactor::ReactorConfig;
use arcchat_session::ConnectionConfig;
use serde::{Deserialize, Serialize};

/// Everything the client binary can be tuned with.
///
/// The loop and connection settings are derived from this one struct, so a
/// value is only ever set in one place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Server hostname or address.
    pub host: String,

    /// Server port.
    pub port: u16,

    /// Show the `Command: ` prompt. Off in silent mode.
    pub prompts: bool,

    /// Upper bound on one readiness wait.
    pub poll_timeout: Duration,

    /// Longest input line, in bytes, including its delimiter.
    pub input_capacity: usize,

    /// Bound on the TCP connect made by `login`.
    pub connect_timeout: Duration,

    /// Largest frame body sent or accepted.
    pub max_frame_len: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 2502,
            prompts: true,
            poll_timeout: Duration::from_millis(200),
            input_capacity: 1024,
            connect_timeout: Duration::from_secs(5),
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
        }
    }
}

impl ClientConfig {
    pub fn reactor_config(&self) -> ReactorConfig {
        ReactorConfig {
            poll_timeout: self.poll_timeout,
            input_capacity: self.input_capacity,
            prompts: self.prompts,
        }
    }

    pub fn connection_config(&self) -> ConnectionConfig {
        ConnectionConfig {
            host: self.host.clone(),
            port: self.port,
            connect_timeout: self.connect_timeout,
            max_frame_len: self.max_frame_len,
        }
    }
}
