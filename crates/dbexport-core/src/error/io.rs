use super::{Error, ErrorKind};

/// Error from the local filesystem while writing output files.
#[derive(Debug)]
pub(super) struct IoError {
    inner: std::io::Error,
}

impl IoError {
    pub(super) fn is_transient(&self) -> bool {
        use std::io::ErrorKind::*;

        matches!(
            self.inner.kind(),
            Interrupted | TimedOut | WouldBlock | ConnectionReset | ConnectionAborted
        )
    }
}

impl std::error::Error for IoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.inner)
    }
}

impl core::fmt::Display for IoError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.inner, f)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        Error::from(ErrorKind::Io(IoError { inner: err }))
    }
}
