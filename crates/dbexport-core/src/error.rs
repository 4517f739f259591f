mod adhoc;
mod catalog_drift;
mod driver;
mod invalid_connection_url;
mod io;
mod shard_read;
mod snapshot_acquisition;
mod timeout;
mod unsupported_type;
mod write;

use adhoc::AdhocError;
use catalog_drift::CatalogDriftError;
use driver::DriverError;
use invalid_connection_url::InvalidConnectionUrlError;
use io::IoError;
use shard_read::ShardReadError;
use snapshot_acquisition::SnapshotAcquisitionError;
use std::sync::Arc;
use timeout::TimeoutError;
use unsupported_type::UnsupportedTypeError;
use write::WriteError;

/// Returns early with an ad-hoc [`Error`] built from a format string.
#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::Error::from_args(format_args!($($arg)*)))
    };
}

/// Builds an ad-hoc [`Error`] from a format string.
#[macro_export]
macro_rules! err {
    ($($arg:tt)*) => {
        $crate::Error::from_args(format_args!($($arg)*))
    };
}

/// An error that can occur while exporting a database.
///
/// The error is a single pointer wide and cheap to clone, so it can be
/// recorded in the manifest and in the run report at the same time.
#[derive(Clone)]
pub struct Error {
    inner: Option<Arc<ErrorInner>>,
}

#[derive(Debug)]
struct ErrorInner {
    kind: ErrorKind,
    cause: Option<Error>,
}

impl Error {
    /// Adds context to this error.
    ///
    /// Context is displayed in reverse order: the most recently added context is shown first,
    /// followed by earlier context, ending with the root cause.
    #[inline(always)]
    pub fn context(self, consequent: impl IntoError) -> Error {
        self.context_impl(consequent.into_error())
    }

    #[inline(never)]
    #[cold]
    fn context_impl(self, consequent: Error) -> Error {
        let mut err = consequent;
        if err.inner.is_none() {
            err = Error::from(ErrorKind::Unknown);
        }
        let inner = err.inner.as_mut().unwrap();
        assert!(
            inner.cause.is_none(),
            "consequent error must not already have a cause"
        );
        Arc::get_mut(inner)
            .expect("consequent error must be uniquely owned")
            .cause = Some(self);
        err
    }

    fn chain(&self) -> impl Iterator<Item = &Error> {
        let mut err = self;
        core::iter::once(err).chain(core::iter::from_fn(move || {
            err = err.inner.as_ref().and_then(|inner| inner.cause.as_ref())?;
            Some(err)
        }))
    }

    fn kind(&self) -> &ErrorKind {
        self.inner
            .as_ref()
            .map(|inner| &inner.kind)
            .unwrap_or(&ErrorKind::Unknown)
    }

    /// Returns `true` if retrying the failed operation may succeed.
    ///
    /// The chain is walked from the outermost context inwards. A permanent
    /// failure (unsupported type, catalog drift, cancellation) anywhere above
    /// a transient cause wins.
    pub fn is_transient(&self) -> bool {
        for err in self.chain() {
            match err.kind() {
                ErrorKind::UnsupportedType(_)
                | ErrorKind::CatalogDrift(_)
                | ErrorKind::Cancelled
                | ErrorKind::Timeout(_) => return false,
                ErrorKind::Driver(err) if err.transient => return true,
                ErrorKind::Io(err) if err.is_transient() => return true,
                _ => {}
            }
        }
        false
    }

    /// The name of the object this error is attributed to, if any.
    pub fn object(&self) -> Option<&str> {
        self.chain().find_map(|err| match err.kind() {
            ErrorKind::UnsupportedType(err) => Some(&*err.object),
            ErrorKind::CatalogDrift(err) => Some(&*err.object),
            ErrorKind::ShardRead(err) => Some(&*err.object),
            ErrorKind::Write(err) => Some(&*err.object),
            _ => None,
        })
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self.kind() {
            ErrorKind::Driver(err) => Some(err),
            ErrorKind::Io(err) => Some(err),
            ErrorKind::Anyhow(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        let mut it = self.chain().peekable();
        while let Some(err) = it.next() {
            core::fmt::Display::fmt(err.kind(), f)?;
            if it.peek().is_some() {
                f.write_str(": ")?;
            }
        }
        Ok(())
    }
}

impl core::fmt::Debug for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        if !f.alternate() {
            core::fmt::Display::fmt(self, f)
        } else {
            let Some(ref inner) = self.inner else {
                return f.debug_struct("Error").field("kind", &"None").finish();
            };
            f.debug_struct("Error")
                .field("kind", &inner.kind)
                .field("cause", &inner.cause)
                .finish()
        }
    }
}

#[derive(Debug)]
enum ErrorKind {
    Anyhow(anyhow::Error),
    Adhoc(AdhocError),
    Driver(DriverError),
    Io(IoError),
    InvalidConnectionUrl(InvalidConnectionUrlError),
    UnsupportedType(UnsupportedTypeError),
    CatalogDrift(CatalogDriftError),
    ShardRead(ShardReadError),
    SnapshotAcquisition(SnapshotAcquisitionError),
    Write(WriteError),
    Timeout(TimeoutError),
    Cancelled,
    Unknown,
}

impl core::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        use self::ErrorKind::*;

        match self {
            Anyhow(err) => core::fmt::Display::fmt(err, f),
            Adhoc(err) => core::fmt::Display::fmt(err, f),
            Driver(err) => core::fmt::Display::fmt(err, f),
            Io(err) => core::fmt::Display::fmt(err, f),
            InvalidConnectionUrl(err) => core::fmt::Display::fmt(err, f),
            UnsupportedType(err) => core::fmt::Display::fmt(err, f),
            CatalogDrift(err) => core::fmt::Display::fmt(err, f),
            ShardRead(err) => core::fmt::Display::fmt(err, f),
            SnapshotAcquisition(err) => core::fmt::Display::fmt(err, f),
            Write(err) => core::fmt::Display::fmt(err, f),
            Timeout(err) => core::fmt::Display::fmt(err, f),
            Cancelled => f.write_str("export cancelled"),
            Unknown => f.write_str("unknown dbexport error"),
        }
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Error {
        Error {
            inner: Some(Arc::new(ErrorInner { kind, cause: None })),
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Error {
        Error::from(ErrorKind::Anyhow(err))
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Error {
        Error::from(anyhow::Error::from(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Error {
        Error::from(anyhow::Error::from(err))
    }
}

/// Trait for types that can be converted into an Error.
pub trait IntoError {
    /// Converts this type into an Error.
    fn into_error(self) -> Error;
}

impl IntoError for Error {
    #[inline(always)]
    fn into_error(self) -> Error {
        self
    }
}
