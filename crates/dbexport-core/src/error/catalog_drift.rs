use super::{Error, ErrorKind};

/// The catalog changed while the object was being exported.
#[derive(Debug)]
pub(super) struct CatalogDriftError {
    pub(super) object: Box<str>,
    reason: Box<str>,
}

impl std::error::Error for CatalogDriftError {}

impl core::fmt::Display for CatalogDriftError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "catalog drift: object={} {}", self.object, self.reason)
    }
}

impl Error {
    /// Creates a catalog drift error for `object`.
    pub fn catalog_drift(object: impl Into<String>, reason: impl Into<String>) -> Error {
        Error::from(ErrorKind::CatalogDrift(CatalogDriftError {
            object: object.into().into(),
            reason: reason.into().into(),
        }))
    }

    /// Returns `true` if this error, or any error it wraps, is catalog drift.
    pub fn is_catalog_drift(&self) -> bool {
        self.chain()
            .any(|err| matches!(err.kind(), ErrorKind::CatalogDrift(_)))
    }
}
