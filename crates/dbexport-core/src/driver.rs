mod capability;
pub use capability::Capability;

pub mod operation;
pub use operation::Operation;

mod response;
pub use response::Response;

mod snapshot;
pub use snapshot::{Snapshot, TimestampBound};

use crate::{async_trait, Result};

use std::fmt::Debug;

/// A source database the exporter can read from.
#[async_trait]
pub trait Driver: Debug + Send + Sync + 'static {
    /// Describes the dialect and object kinds the database supports.
    fn capability(&self) -> &'static Capability;

    /// Establishes the single read view every operation of a run uses.
    ///
    /// The returned [`Snapshot`] must keep the view alive for as long as any
    /// clone of it exists.
    async fn snapshot(&self, bound: &TimestampBound) -> Result<Snapshot>;

    /// Opens a new session against the database.
    async fn connect(&self) -> Result<Box<dyn Connection>>;

    /// Upper bound on concurrently open sessions, if the database has one.
    fn max_connections(&self) -> Option<usize> {
        None
    }
}

/// One session against the source database.
#[async_trait]
pub trait Connection: Debug + Send + 'static {
    fn capability(&self) -> &'static Capability;

    /// Execute an operation. Reads observe `snapshot`; catalog verification
    /// ([`Operation::DescribeObject`]) observes the latest state.
    async fn exec(&mut self, snapshot: &Snapshot, op: Operation) -> Result<Response>;
}
