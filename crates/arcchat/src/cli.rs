//! Command-line arguments.
//!
//! `-h` selects the host, so clap's own help flag is disabled and usage is
//! printed by `-u` instead.

use clap::{ArgAction, Parser};

use crate::ClientConfig;

#[derive(Parser, Debug)]
#[command(
    name = "arcchat",
    about = "Command-line chat client for channel-based game servers",
    disable_help_flag = true
)]
pub struct Cli {
    /// Remote hostname.
    #[arg(short = 'h', long, value_name = "HOST", default_value = "localhost")]
    pub host: String,

    /// Remote port.
    #[arg(short = 'p', long, value_name = "PORT", default_value_t = 2502)]
    pub port: u16,

    /// Silent mode (no command prompts).
    #[arg(short = 's', long)]
    pub silent: bool,

    /// Print usage.
    #[arg(short = 'u', long = "usage", action = ArgAction::Help)]
    usage: Option<bool>,
}

impl Cli {
    /// Applies the flags on top of the default configuration.
    pub fn into_config(self) -> ClientConfig {
        ClientConfig {
            host: self.host,
            port: self.port,
            prompts: !self.silent,
            ..ClientConfig::default()
        }
    }
}
