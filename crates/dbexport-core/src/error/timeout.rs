use super::{Error, ErrorKind};
use std::time::Duration;

/// The run exceeded its deadline.
#[derive(Debug)]
pub(super) struct TimeoutError {
    elapsed: Duration,
}

impl std::error::Error for TimeoutError {}

impl core::fmt::Display for TimeoutError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "export timed out after {:?}", self.elapsed)
    }
}

impl Error {
    /// Creates a timeout error.
    pub fn timeout(elapsed: Duration) -> Error {
        Error::from(ErrorKind::Timeout(TimeoutError { elapsed }))
    }

    /// Returns `true` if this error is a timeout error.
    pub fn is_timeout(&self) -> bool {
        matches!(self.kind(), ErrorKind::Timeout(_))
    }

    /// Creates a cancellation error.
    pub fn cancelled() -> Error {
        Error::from(ErrorKind::Cancelled)
    }

    /// Returns `true` if this error, or any error it wraps, is a cancellation.
    pub fn is_cancelled(&self) -> bool {
        self.chain().any(|err| matches!(err.kind(), ErrorKind::Cancelled))
    }
}
