use super::{Error, ErrorKind};

/// Writing a shard's output file failed.
#[derive(Debug)]
pub(super) struct WriteError {
    pub(super) object: Box<str>,
    shard: usize,
}

impl std::error::Error for WriteError {}

impl core::fmt::Display for WriteError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "failed to write output: object={} shard={}",
            self.object, self.shard
        )
    }
}

impl Error {
    /// Creates a write error for one shard of `object`.
    pub fn write(object: impl Into<String>, shard: usize) -> Error {
        Error::from(ErrorKind::Write(WriteError {
            object: object.into().into(),
            shard,
        }))
    }

    /// Returns `true` if this error, or any error it wraps, is a write error.
    pub fn is_write(&self) -> bool {
        self.chain()
            .any(|err| matches!(err.kind(), ErrorKind::Write(_)))
    }
}
