use super::{Error, ErrorKind};

/// Error from a source database driver.
#[derive(Debug)]
pub(super) struct DriverError {
    pub(super) inner: Box<dyn std::error::Error + Send + Sync>,

    /// True when the driver reported a condition that may clear on retry
    /// (timeouts, dropped connections, resource exhaustion).
    pub(super) transient: bool,
}

impl std::error::Error for DriverError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.inner.as_ref())
    }
}

impl core::fmt::Display for DriverError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.inner, f)?;
        let mut source = self.inner.source();
        while let Some(err) = source {
            write!(f, ": {}", err)?;
            source = err.source();
        }
        Ok(())
    }
}

impl Error {
    /// Creates an error from a driver error that will not clear on retry.
    ///
    /// This is the preferred way to convert driver-specific errors
    /// (tokio-postgres, in-memory engine faults, etc.) into dbexport errors.
    pub fn driver(err: impl std::error::Error + Send + Sync + 'static) -> Error {
        Error::from(ErrorKind::Driver(DriverError {
            inner: Box::new(err),
            transient: false,
        }))
    }

    /// Creates an error from a driver error that may succeed when retried.
    pub fn driver_transient(err: impl std::error::Error + Send + Sync + 'static) -> Error {
        Error::from(ErrorKind::Driver(DriverError {
            inner: Box::new(err),
            transient: true,
        }))
    }

    /// Returns `true` if this error is a driver error.
    pub fn is_driver(&self) -> bool {
        matches!(self.kind(), ErrorKind::Driver(_))
    }
}
