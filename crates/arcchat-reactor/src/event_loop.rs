//! The reactor loop.
//!
//! One thread, one suspension point. Every cycle:
//!
//! ```text
//! dispatch complete lines ──→ wait (timeout) ──→ read input / flag work
//!          ↑                                              │
//!          └──────────── do_work() once if flagged ←──────┘
//! ```
//!
//! The loop owns the [`DescriptorRegistry`] and lends it to the [`Driver`]
//! for every call, so collaborator callbacks can change interest without any
//! shared global state.

use std::io::Read;
use std::ops::ControlFlow;
use std::os::fd::RawFd;
use std::time::Duration;

use crate::{DescriptorRegistry, Interest, LineBuffer, Poller, ReactorError};

/// Settings for an [`EventLoop`].
#[derive(Debug, Clone)]
pub struct ReactorConfig {
    /// Upper bound on a single readiness wait.
    ///
    /// Short enough to keep the prompt responsive, long enough not to spin.
    pub poll_timeout: Duration,

    /// Capacity of the input line buffer in bytes.
    pub input_capacity: usize,

    /// Whether to ask the driver for a prompt after each input read.
    pub prompts: bool,
}

impl Default for ReactorConfig {
    fn default() -> Self {
        Self {
            poll_timeout: Duration::from_millis(200),
            input_capacity: 1024,
            prompts: true,
        }
    }
}

/// The application side of the loop.
///
/// Every method receives the registry so the driver, and any collaborator it
/// owns, can register or unregister descriptors synchronously.
pub trait Driver {
    /// Handles one complete input line (delimiter already removed).
    ///
    /// Returning `Break(code)` stops the loop with that exit status.
    fn handle_line(
        &mut self,
        line: &str,
        registry: &mut DescriptorRegistry,
    ) -> ControlFlow<i32>;

    /// Lets the collaborator process all of its pending I/O.
    ///
    /// Called at most once per cycle, however many of its descriptors are
    /// ready.
    fn do_work(&mut self, registry: &mut DescriptorRegistry);

    /// Releases every resource the driver owns. Called exactly once, when
    /// the loop stops.
    fn shutdown(&mut self, registry: &mut DescriptorRegistry);

    /// Shows an input prompt.
    fn prompt(&mut self) {}

    /// Reports a non-fatal loop error.
    fn report(&mut self, _error: &ReactorError) {}
}

/// A single-threaded readiness loop over an input source and the
/// descriptors registered by a collaborator.
pub struct EventLoop<P, R> {
    config: ReactorConfig,
    registry: DescriptorRegistry,
    input: LineBuffer,
    input_fd: RawFd,
    reader: R,
    poller: P,
}

impl<P: Poller, R: Read> EventLoop<P, R> {
    /// Creates a loop reading lines from `reader`, whose readiness is
    /// signalled on `input_fd`.
    ///
    /// The input descriptor is registered for `READABLE` immediately.
    pub fn new(
        config: ReactorConfig,
        poller: P,
        input_fd: RawFd,
        reader: R,
    ) -> Self {
        let mut registry = DescriptorRegistry::new();
        registry.register(input_fd, Interest::READABLE);

        Self {
            input: LineBuffer::new(config.input_capacity),
            config,
            registry,
            input_fd,
            reader,
            poller,
        }
    }

    /// The loop's registry.
    pub fn registry(&self) -> &DescriptorRegistry {
        &self.registry
    }

    /// Mutable access to the registry, for setup before [`run`](Self::run).
    pub fn registry_mut(&mut self) -> &mut DescriptorRegistry {
        &mut self.registry
    }

    /// Runs until the driver asks to stop or the input reaches end of file.
    ///
    /// On the way out the driver's [`shutdown`](Driver::shutdown) runs once
    /// and the registry is cleared. Returns the exit status.
    pub fn run<D: Driver>(&mut self, driver: &mut D) -> i32 {
        tracing::debug!(input_fd = self.input_fd, "event loop started");

        if self.config.prompts {
            driver.prompt();
        }

        let code = loop {
            if let ControlFlow::Break(code) = self.turn(driver) {
                break code;
            }
        };

        driver.shutdown(&mut self.registry);
        self.registry.clear();
        tracing::debug!(code, "event loop stopped");
        code
    }

    /// Runs a single cycle of the loop.
    pub fn turn<D: Driver>(&mut self, driver: &mut D) -> ControlFlow<i32> {
        while let Some(line) = self.input.next_line() {
            if let ControlFlow::Break(code) =
                driver.handle_line(&line, &mut self.registry)
            {
                return ControlFlow::Break(code);
            }
        }

        let readiness =
            match self.poller.wait(&self.registry, self.config.poll_timeout) {
                Ok(readiness) => readiness,
                Err(e) => {
                    tracing::warn!(error = %e, "readiness wait failed");
                    driver.report(&ReactorError::Wait(e));
                    // A failing wait returns at once; pace the retries.
                    std::thread::sleep(self.config.poll_timeout);
                    return ControlFlow::Continue(());
                }
            };

        let mut work = false;
        for (fd, interest) in readiness.iter() {
            if fd == self.input_fd && interest.contains(Interest::READABLE) {
                if let ControlFlow::Break(code) = self.read_input(driver) {
                    return ControlFlow::Break(code);
                }
            } else {
                work = true;
            }
        }

        if work {
            driver.do_work(&mut self.registry);
        }

        ControlFlow::Continue(())
    }

    fn read_input<D: Driver>(&mut self, driver: &mut D) -> ControlFlow<i32> {
        match self.input.fill_from(&mut self.reader) {
            Ok(0) => {
                tracing::info!("input closed");
                return ControlFlow::Break(0);
            }
            Ok(n) => {
                tracing::trace!(bytes = n, "input read");
                if self.config.prompts {
                    driver.prompt();
                }
            }
            Err(ReactorError::Read(e))
                if matches!(
                    e.kind(),
                    std::io::ErrorKind::Interrupted
                        | std::io::ErrorKind::WouldBlock
                ) => {}
            Err(e) => {
                tracing::warn!(error = %e, "input error");
                driver.report(&e);
            }
        }
        ControlFlow::Continue(())
    }
}
