//! Line-by-line user output.

use std::fmt::Display;
use std::io::{self, Write};

/// The prompt shown before each command.
pub const PROMPT: &str = "Command: ";

/// Writes user-facing lines, flushing after each one.
///
/// Output failures are logged and otherwise ignored: a closed stdout must not
/// take the event loop down with it.
#[derive(Debug)]
pub struct Console<W: Write> {
    out: W,
}

impl<W: Write> Console<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Writes `text` followed by a newline.
    pub fn line(&mut self, text: impl Display) {
        let result = writeln!(self.out, "{text}").and_then(|()| self.out.flush());
        self.log_failure(result);
    }

    /// Writes the prompt without a newline.
    pub fn prompt(&mut self) {
        let result = self
            .out
            .write_all(PROMPT.as_bytes())
            .and_then(|()| self.out.flush());
        self.log_failure(result);
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn log_failure(&self, result: io::Result<()>) {
        if let Err(e) = result {
            tracing::debug!(error = %e, "console write failed");
        }
    }
}
