//! Single-threaded reactor for arcchat.
//!
//! Provides the [`DescriptorRegistry`] that an I/O collaborator fills through
//! the [`Registrar`] trait, the [`LineBuffer`] that turns raw input bytes into
//! complete lines, and the [`EventLoop`] that multiplexes both behind a
//! [`Poller`].
//!
//! # How it fits in the stack
//!
//! ```text
//! input fd ──→ LineBuffer ──→ Driver::handle_line   (command dispatch)
//! other fds ─────────────────→ Driver::do_work      (collaborator I/O)
//! ```
//!
//! The loop never interprets the collaborator's descriptors. It only knows
//! that "some descriptor I don't own became ready" and hands control back
//! once per cycle.

mod error;
mod event_loop;
mod line_buffer;
mod poller;
mod registry;

pub use error::ReactorError;
pub use event_loop::{Driver, EventLoop, ReactorConfig};
pub use line_buffer::LineBuffer;
pub use poller::{FdReader, Poller, Readiness, SelectPoller};
pub use registry::DescriptorRegistry;

use std::os::fd::RawFd;

use bitflags::bitflags;

bitflags! {
    /// Readiness classes a descriptor can be watched for.
    ///
    /// Each class is an independent dimension: a socket waiting to flush
    /// output is watched for `WRITABLE` only while it has bytes queued, while
    /// `READABLE | ERROR` usually stays on for its whole life.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Interest: u8 {
        /// Data can be read without blocking.
        const READABLE = 1 << 0;
        /// Data can be written without blocking.
        const WRITABLE = 1 << 1;
        /// An exceptional condition is pending.
        const ERROR    = 1 << 2;
    }
}

/// Receives interest changes from an I/O collaborator.
///
/// The collaborator calls these whenever it opens or closes sockets it wants
/// multiplexed, or when its write queue fills or drains. Implementations must
/// not block.
pub trait Registrar {
    /// The collaborator wants `fd` watched for every class in `interest`.
    fn interest_added(&mut self, fd: RawFd, interest: Interest);

    /// The collaborator no longer wants `fd` watched for the classes in
    /// `interest`. Other classes on the same descriptor are untouched.
    fn interest_removed(&mut self, fd: RawFd, interest: Interest);
}
