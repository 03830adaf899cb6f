use std::io;

/// Errors raised by the reactor loop.
///
/// None of these are fatal: the loop reports them to its driver and keeps
/// running.
#[derive(Debug, thiserror::Error)]
pub enum ReactorError {
    /// The readiness wait itself failed.
    #[error("readiness wait failed: {0}")]
    Wait(#[source] io::Error),

    /// Reading from the input descriptor failed.
    #[error("input read failed: {0}")]
    Read(#[source] io::Error),

    /// The input buffer filled up without a line delimiter.
    ///
    /// The partial line is discarded; it is never dispatched.
    #[error("input buffer exhausted: line exceeds {capacity} bytes")]
    Overflow {
        /// Capacity of the line buffer in bytes.
        capacity: usize,
    },
}
