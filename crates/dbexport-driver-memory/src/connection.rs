use crate::Shared;

use dbexport_core::{
    async_trait,
    driver::{
        operation::{ReadShard, SplitPoints},
        Capability, Operation, Response, Snapshot,
    },
    stmt::{Key, ValueStream},
    Error, Result,
};
use std::sync::Arc;
use tracing::trace;

/// A session against a [`Memory`](crate::Memory) database.
#[derive(Debug)]
pub(crate) struct Connection {
    shared: Arc<Shared>,
}

impl Connection {
    pub(crate) fn new(shared: Arc<Shared>) -> Self {
        Self { shared }
    }

    fn read_catalog(&self, snapshot: u64) -> Response {
        let catalog = self.shared.state().catalog(self.shared.dialect, snapshot);
        Response::Catalog(catalog)
    }

    fn split_points(&self, op: SplitPoints, snapshot: u64) -> Result<Response> {
        let keys = self.shared.state().keys(&op.table, snapshot)?;

        if op.count < 2 || keys.len() < 2 {
            return Ok(Response::Keys(vec![]));
        }

        // Evenly spaced existing keys; the first key would only produce an
        // empty leading range.
        let count = op.count.min(keys.len());
        let mut points = (1..count)
            .map(|i| keys[i * keys.len() / count].clone())
            .collect::<Vec<Key>>();
        points.dedup();

        Ok(Response::Keys(points))
    }

    async fn read_shard(&self, op: ReadShard, snapshot: u64) -> Result<Response> {
        self.shared.faults.wait_released().await;

        let rows = {
            let state = self.shared.state();
            let names = op
                .columns
                .iter()
                .map(|field| field.name.clone())
                .collect::<Vec<_>>();
            let positions = state.column_positions(&op.table, &names)?;

            state
                .scan(&op.table, snapshot, &op.range)?
                .into_iter()
                .map(|row| row.project(&positions))
                .collect::<Vec<_>>()
        };

        trace!(table = %op.table, range = ?op.range, rows = rows.len(), "read shard");

        if let Some(failure) = self.shared.faults.take_failure(&op.table) {
            let error = injected(&op.table, failure.transient);
            let stream = rows
                .into_iter()
                .take(1)
                .map(Ok)
                .chain(std::iter::once(Err(error)));
            return Ok(Response::Rows(ValueStream::from_iter(stream)));
        }

        Ok(Response::Rows(ValueStream::from_vec(rows)))
    }
}

#[async_trait]
impl dbexport_core::Connection for Connection {
    fn capability(&self) -> &'static Capability {
        self.shared.dialect.capability()
    }

    async fn exec(&mut self, snapshot: &Snapshot, op: Operation) -> Result<Response> {
        let seq = parse_snapshot(snapshot)?;

        match op {
            Operation::ReadCatalog(_) => Ok(self.read_catalog(seq)),
            Operation::DescribeObject(op) => {
                Ok(Response::Object(self.shared.state().describe(&op.name)))
            }
            Operation::EstimateRows(op) => {
                let count = self.shared.state().keys(&op.table, seq)?.len();
                Ok(Response::Count(count as u64))
            }
            Operation::SplitPoints(op) => self.split_points(op, seq),
            Operation::ReadShard(op) => self.read_shard(op, seq).await,
        }
    }
}

fn parse_snapshot(snapshot: &Snapshot) -> Result<u64> {
    snapshot.token().parse().map_err(|_| {
        dbexport_core::err!("snapshot `{}` was not issued by this database", snapshot.token())
    })
}

fn injected(table: &str, transient: bool) -> Error {
    let err = std::io::Error::new(
        std::io::ErrorKind::ConnectionReset,
        format!("injected read failure on `{table}`"),
    );
    if transient {
        Error::driver_transient(err)
    } else {
        Error::driver(err)
    }
}
