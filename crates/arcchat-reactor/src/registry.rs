//! The descriptor registry: which fds the loop watches, and for what.
//!
//! The registry is filled on behalf of an external collaborator (see
//! [`Registrar`]) plus the loop's own input descriptor. Every poll cycle the
//! [`Poller`](crate::Poller) builds fresh working sets from it, so nothing
//! here is ever consumed destructively.
//!
//! # Maximum tracking
//!
//! `select(2)` needs the highest watched descriptor. It only grows on
//! registration, so keeping it is O(1) there. When the current maximum loses
//! its last class the registry rescans for the new one. Entries live in a
//! `BTreeMap`, which makes that rescan a walk to the last key instead of a
//! sweep over `0..=max`.

use std::collections::BTreeMap;
use std::os::fd::RawFd;

use crate::{Interest, Registrar};

/// Watched descriptors and their interest classes.
///
/// ## Invariants
///
/// - An entry's interest is exactly the union of the classes registered for
///   it, minus the classes unregistered since.
/// - An entry whose interest becomes empty is removed.
/// - `max_fd()` equals the largest key in the map, or `None` when empty.
#[derive(Debug, Default)]
pub struct DescriptorRegistry {
    entries: BTreeMap<RawFd, Interest>,
    max_fd: Option<RawFd>,
}

impl DescriptorRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `fd` to every class in `interest`.
    ///
    /// Registering a class twice is a no-op. Negative descriptors and empty
    /// interest are ignored.
    pub fn register(&mut self, fd: RawFd, interest: Interest) {
        if fd < 0 || interest.is_empty() {
            tracing::warn!(fd, ?interest, "ignoring invalid registration");
            return;
        }

        *self.entries.entry(fd).or_default() |= interest;

        if self.max_fd.is_none_or(|max| fd > max) {
            self.max_fd = Some(fd);
        }

        tracing::trace!(fd, ?interest, "interest registered");
    }

    /// Removes `fd` from every class in `interest`.
    ///
    /// Classes not named stay registered. When the last class goes the entry
    /// goes with it, and if it was the maximum a new maximum is computed.
    pub fn unregister(&mut self, fd: RawFd, interest: Interest) {
        let Some(current) = self.entries.get_mut(&fd) else {
            return;
        };

        current.remove(interest);
        tracing::trace!(fd, ?interest, "interest unregistered");

        if !current.is_empty() {
            return;
        }

        self.entries.remove(&fd);

        if self.max_fd == Some(fd) {
            self.max_fd = self.entries.keys().next_back().copied();
        }
    }

    /// Returns the interest currently registered for `fd`.
    ///
    /// Unknown descriptors report empty interest.
    pub fn interest(&self, fd: RawFd) -> Interest {
        self.entries.get(&fd).copied().unwrap_or_default()
    }

    /// Returns `true` if `fd` is watched for at least one class.
    pub fn contains(&self, fd: RawFd) -> bool {
        self.entries.contains_key(&fd)
    }

    /// The highest watched descriptor, if any.
    pub fn max_fd(&self) -> Option<RawFd> {
        self.max_fd
    }

    /// Iterates over every watched descriptor in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = (RawFd, Interest)> + '_ {
        self.entries.iter().map(|(fd, interest)| (*fd, *interest))
    }

    /// Iterates over the descriptors watched for any class in `class`.
    pub fn watching(
        &self,
        class: Interest,
    ) -> impl Iterator<Item = RawFd> + '_ {
        self.iter()
            .filter(move |(_, interest)| interest.intersects(class))
            .map(|(fd, _)| fd)
    }

    /// Number of watched descriptors.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is watched.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Stops watching every descriptor.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.max_fd = None;
        tracing::debug!("descriptor registry cleared");
    }
}

impl Registrar for DescriptorRegistry {
    fn interest_added(&mut self, fd: RawFd, interest: Interest) {
        self.register(fd, interest);
    }

    fn interest_removed(&mut self, fd: RawFd, interest: Interest) {
        self.unregister(fd, interest);
    }
}
