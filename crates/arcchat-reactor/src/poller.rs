//! Readiness waiting.
//!
//! [`Poller`] is the seam between the loop and the OS facility. The
//! production implementation, [`SelectPoller`], uses `select(2)`. Tests
//! drive the loop with scripted pollers instead.

use std::io::{self, Read};
use std::mem::MaybeUninit;
use std::os::fd::RawFd;
use std::time::Duration;

use crate::{DescriptorRegistry, Interest};

/// The descriptors a wait reported ready, with the classes they fired in.
///
/// An empty readiness means the wait timed out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Readiness {
    ready: Vec<(RawFd, Interest)>,
}

impl Readiness {
    /// Creates an empty readiness (a timeout).
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `fd` is ready for the classes in `interest`.
    pub fn push(&mut self, fd: RawFd, interest: Interest) {
        if !interest.is_empty() {
            self.ready.push((fd, interest));
        }
    }

    /// Iterates over the ready descriptors.
    pub fn iter(&self) -> impl Iterator<Item = (RawFd, Interest)> + '_ {
        self.ready.iter().copied()
    }

    /// Returns `true` if nothing became ready.
    pub fn is_empty(&self) -> bool {
        self.ready.is_empty()
    }

    /// Number of ready descriptors.
    pub fn len(&self) -> usize {
        self.ready.len()
    }
}

impl FromIterator<(RawFd, Interest)> for Readiness {
    fn from_iter<I: IntoIterator<Item = (RawFd, Interest)>>(iter: I) -> Self {
        let mut readiness = Self::new();
        for (fd, interest) in iter {
            readiness.push(fd, interest);
        }
        readiness
    }
}

/// Blocks until a registered descriptor is ready or the timeout elapses.
pub trait Poller {
    /// Waits on every descriptor in `registry` for its registered classes.
    ///
    /// Implementations must take fresh working copies of the interest sets
    /// on every call; the registry itself is never modified.
    ///
    /// # Errors
    /// Returns the OS error if the wait fails. Interrupted waits should be
    /// reported as a timeout rather than an error.
    fn wait(
        &mut self,
        registry: &DescriptorRegistry,
        timeout: Duration,
    ) -> io::Result<Readiness>;
}

// ---------------------------------------------------------------------------
// SelectPoller
// ---------------------------------------------------------------------------

/// A [`Poller`] backed by `select(2)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SelectPoller;

impl SelectPoller {
    /// Creates a new select-based poller.
    pub fn new() -> Self {
        Self
    }
}

impl Poller for SelectPoller {
    fn wait(
        &mut self,
        registry: &DescriptorRegistry,
        timeout: Duration,
    ) -> io::Result<Readiness> {
        let Some(max_fd) = registry.max_fd() else {
            std::thread::sleep(timeout);
            return Ok(Readiness::new());
        };

        if max_fd as usize >= libc::FD_SETSIZE {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "descriptor {max_fd} exceeds FD_SETSIZE ({})",
                    libc::FD_SETSIZE
                ),
            ));
        }

        // select() overwrites its sets, so they are rebuilt every call.
        let mut read = FdSet::new();
        let mut write = FdSet::new();
        let mut except = FdSet::new();
        for (fd, interest) in registry.iter() {
            if interest.contains(Interest::READABLE) {
                read.insert(fd);
            }
            if interest.contains(Interest::WRITABLE) {
                write.insert(fd);
            }
            if interest.contains(Interest::ERROR) {
                except.insert(fd);
            }
        }

        // Re-initialized every call: Linux writes the time left back into it.
        let mut tv = libc::timeval {
            tv_sec: timeout.as_secs() as libc::time_t,
            tv_usec: timeout.subsec_micros() as libc::suseconds_t,
        };

        // SAFETY: the three sets are valid, initialized `fd_set`s that live
        // for the whole call, and every fd in them is below FD_SETSIZE.
        let rc = unsafe {
            libc::select(
                max_fd + 1,
                read.as_mut_ptr(),
                write.as_mut_ptr(),
                except.as_mut_ptr(),
                &mut tv,
            )
        };

        if rc < 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                return Ok(Readiness::new());
            }
            return Err(err);
        }

        let mut readiness = Readiness::new();
        if rc == 0 {
            return Ok(readiness);
        }

        for (fd, _) in registry.iter() {
            let mut fired = Interest::empty();
            if read.contains(fd) {
                fired |= Interest::READABLE;
            }
            if write.contains(fd) {
                fired |= Interest::WRITABLE;
            }
            if except.contains(fd) {
                fired |= Interest::ERROR;
            }
            readiness.push(fd, fired);
        }

        Ok(readiness)
    }
}

/// Owned `fd_set` with safe accessors.
struct FdSet(libc::fd_set);

impl FdSet {
    fn new() -> Self {
        let mut raw = MaybeUninit::<libc::fd_set>::uninit();
        // SAFETY: FD_ZERO fully initializes the set.
        unsafe {
            libc::FD_ZERO(raw.as_mut_ptr());
            Self(raw.assume_init())
        }
    }

    fn insert(&mut self, fd: RawFd) {
        // SAFETY: callers only insert descriptors below FD_SETSIZE.
        unsafe { libc::FD_SET(fd, &mut self.0) }
    }

    fn contains(&self, fd: RawFd) -> bool {
        // SAFETY: the set is initialized and `fd` is below FD_SETSIZE.
        unsafe { libc::FD_ISSET(fd, &self.0) }
    }

    fn as_mut_ptr(&mut self) -> *mut libc::fd_set {
        &mut self.0
    }
}

// ---------------------------------------------------------------------------
// FdReader
// ---------------------------------------------------------------------------

/// Unbuffered [`Read`] over a borrowed raw descriptor.
///
/// `std::io::Stdin` buffers internally, which would hide bytes from the next
/// `select()`. This reader issues exactly one `read(2)` per call and never
/// closes the descriptor.
#[derive(Debug, Clone, Copy)]
pub struct FdReader {
    fd: RawFd,
}

impl FdReader {
    /// Reads from an arbitrary descriptor owned elsewhere.
    pub fn new(fd: RawFd) -> Self {
        Self { fd }
    }

    /// Reads from standard input.
    pub fn stdin() -> Self {
        Self::new(libc::STDIN_FILENO)
    }

    /// The underlying descriptor.
    pub fn fd(&self) -> RawFd {
        self.fd
    }
}

impl Read for FdReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        // SAFETY: `buf` is valid for writes of `buf.len()` bytes.
        let rc = unsafe {
            libc::read(self.fd, buf.as_mut_ptr().cast(), buf.len())
        };
        if rc < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(rc as usize)
    }
}
