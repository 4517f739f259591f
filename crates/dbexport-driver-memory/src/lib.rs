//! An in-process, multi-version database for exercising the exporter.
//!
//! Every write commits at the next sequence number, and reads at a snapshot
//! see exactly the writes committed at or before it. Both dialects are
//! supported; models and search indexes only where the dialect has them.

mod connection;
use connection::Connection;

mod fault;
pub use fault::ReadHold;
use fault::Faults;

mod state;
use state::State;

use dbexport_core::{
    async_trait,
    driver::{Capability, Driver, Snapshot, TimestampBound},
    schema::Object,
    stmt::{Key, ValueRecord},
    Dialect, Result,
};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;

/// Handle to an in-memory database. Clones share the same data.
#[derive(Debug, Clone)]
pub struct Memory {
    shared: Arc<Shared>,
}

#[derive(Debug)]
struct Shared {
    dialect: Dialect,
    state: Mutex<State>,
    faults: Faults,

    /// The latest snapshot handed out to an export
    snapshots: watch::Sender<Option<u64>>,
}

impl Memory {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            shared: Arc::new(Shared {
                dialect,
                state: Mutex::new(State::default()),
                faults: Faults::default(),
                snapshots: watch::channel(None).0,
            }),
        }
    }

    pub fn google_standard_sql() -> Self {
        Self::new(Dialect::GoogleStandardSql)
    }

    pub fn postgresql() -> Self {
        Self::new(Dialect::PostgreSql)
    }

    pub fn dialect(&self) -> Dialect {
        self.shared.dialect
    }

    /// Creates a table, model or search index. Returns the commit sequence.
    pub fn create(&self, object: Object) -> Result<u64> {
        let capability = self.shared.dialect.capability();
        self.state().create(capability, object)
    }

    /// Drops an object. Snapshots taken before the drop still list it in
    /// their catalog, but its rows can no longer be read.
    pub fn drop_object(&self, name: &str) -> Result<u64> {
        self.state().drop_object(name)
    }

    /// Inserts or replaces rows in one commit. Each row holds a value for
    /// every column of the table, in column order.
    pub fn insert(&self, table: &str, rows: Vec<ValueRecord>) -> Result<u64> {
        self.state().insert(table, rows)
    }

    /// Deletes rows by primary key in one commit.
    pub fn delete(&self, table: &str, keys: Vec<Key>) -> Result<u64> {
        self.state().delete(table, keys)
    }

    /// The latest commit sequence.
    pub fn latest(&self) -> u64 {
        self.state().latest()
    }

    /// Blocks shard reads until the returned guard is released or dropped.
    /// Catalog reads and planning queries are not blocked.
    pub fn hold_reads(&self) -> ReadHold {
        self.shared.faults.hold()
    }

    /// Makes the next `count` shard reads of `table` fail. Each failing read
    /// yields at most one row before the error.
    pub fn fail_reads(&self, table: &str, count: u32, transient: bool) {
        self.shared.faults.fail(table, count, transient);
    }

    /// Watches the snapshots exports acquire.
    pub fn subscribe_snapshots(&self) -> watch::Receiver<Option<u64>> {
        self.shared.snapshots.subscribe()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.shared.state()
    }
}

impl Shared {
    fn state(&self) -> MutexGuard<'_, State> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait]
impl Driver for Memory {
    fn capability(&self) -> &'static Capability {
        self.shared.dialect.capability()
    }

    async fn snapshot(&self, bound: &TimestampBound) -> Result<Snapshot> {
        let latest = self.latest();

        let seq = match bound {
            TimestampBound::Strong => latest,
            TimestampBound::Exact(token) => {
                let seq: u64 = token.parse().map_err(|_| {
                    dbexport_core::err!("invalid snapshot token `{token}`; expected a commit sequence")
                })?;
                if seq > latest {
                    dbexport_core::bail!(
                        "snapshot {seq} is ahead of the latest commit {latest}"
                    );
                }
                seq
            }
        };

        self.shared.snapshots.send_replace(Some(seq));
        Ok(Snapshot::new(seq.to_string()))
    }

    async fn connect(&self) -> Result<Box<dyn dbexport_core::Connection>> {
        Ok(Box::new(Connection::new(self.shared.clone())))
    }
}
