use super::{Error, ErrorKind};

/// No consistent read view could be established for the run.
#[derive(Debug)]
pub(super) struct SnapshotAcquisitionError;

impl std::error::Error for SnapshotAcquisitionError {}

impl core::fmt::Display for SnapshotAcquisitionError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.write_str("failed to acquire snapshot")
    }
}

impl Error {
    /// Creates a snapshot acquisition error.
    pub fn snapshot_acquisition() -> Error {
        Error::from(ErrorKind::SnapshotAcquisition(SnapshotAcquisitionError))
    }

    /// Returns `true` if this error is a snapshot acquisition error.
    pub fn is_snapshot_acquisition(&self) -> bool {
        matches!(self.kind(), ErrorKind::SnapshotAcquisition(_))
    }
}
