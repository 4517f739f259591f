use super::{Error, ErrorKind};

/// A shard kept failing after every retry was spent.
#[derive(Debug)]
pub(super) struct ShardReadError {
    pub(super) object: Box<str>,
    shard: usize,
    attempts: u32,
}

impl std::error::Error for ShardReadError {}

impl core::fmt::Display for ShardReadError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "shard read failed: object={} shard={} attempts={}",
            self.object, self.shard, self.attempts
        )
    }
}

impl Error {
    /// Creates a shard read error. Attach the last attempt's error with
    /// [`Error::context`]:
    ///
    /// ```
    /// # use dbexport_core::{err, Error};
    /// let err = err!("deadline exceeded").context(Error::shard_read("Singers", 0, 5));
    /// assert_eq!(
    ///     err.to_string(),
    ///     "shard read failed: object=Singers shard=0 attempts=5: deadline exceeded"
    /// );
    /// ```
    pub fn shard_read(object: impl Into<String>, shard: usize, attempts: u32) -> Error {
        Error::from(ErrorKind::ShardRead(ShardReadError {
            object: object.into().into(),
            shard,
            attempts,
        }))
    }

    /// Returns `true` if this error is a shard read error.
    pub fn is_shard_read(&self) -> bool {
        matches!(self.kind(), ErrorKind::ShardRead(_))
    }
}
