use crate::{catalog, driver_error, sql, table_error, transaction, value};

use dbexport_core::{
    async_trait,
    driver::{
        operation::{ReadShard, SplitPoints},
        Capability, Operation, Response, Snapshot,
    },
    stmt::{Key, ValueStream},
    Catalog, Dialect, Result,
};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use tokio_postgres::{types::ToSql, Client};
use tokio_stream::StreamExt;
use tracing::debug;

#[derive(Debug)]
pub(crate) struct Connection {
    client: Arc<Client>,

    /// The schema whose tables are exported
    schema: String,

    /// Set while a shard read's transaction is open. The read commits once
    /// its rows are drained; a read abandoned halfway is rolled back before
    /// the next operation.
    reading: Arc<AtomicBool>,
}

impl Connection {
    pub(crate) fn new(client: Client, schema: String) -> Self {
        Self {
            client: Arc::new(client),
            schema,
            reading: Arc::new(AtomicBool::new(false)),
        }
    }

    async fn reset(&self) -> Result<()> {
        if self.reading.swap(false, Ordering::AcqRel) {
            debug!("rolling back abandoned shard read");
            self.client
                .batch_execute(transaction::ROLLBACK)
                .await
                .map_err(driver_error)?;
        }
        Ok(())
    }

    async fn begin(&self, snapshot: &Snapshot) -> Result<()> {
        self.client
            .batch_execute(&transaction::begin_at(snapshot.token())?)
            .await
            .map_err(driver_error)
    }

    /// Ends the open transaction and returns `result`. A read-only
    /// transaction has nothing to commit, so a failed `COMMIT` only matters
    /// when the read itself succeeded.
    async fn end<T>(&self, result: Result<T>) -> Result<T> {
        let commit = self
            .client
            .batch_execute(transaction::COMMIT)
            .await
            .map_err(driver_error);
        let value = result?;
        commit?;
        Ok(value)
    }

    async fn read_catalog(&self, snapshot: &Snapshot) -> Result<Catalog> {
        self.begin(snapshot).await?;
        let objects = catalog::load(&self.client, &self.schema, None).await;
        let objects = self.end(objects).await?;
        Ok(Catalog::new(Dialect::PostgreSql, objects))
    }

    async fn describe(&self, name: &str) -> Result<Response> {
        self.client
            .batch_execute(transaction::BEGIN_READ)
            .await
            .map_err(driver_error)?;
        let objects = catalog::load(&self.client, &self.schema, Some(name)).await;
        let mut objects = self.end(objects).await?;
        Ok(Response::Object(objects.pop()))
    }

    async fn estimate_rows(&self, snapshot: &Snapshot, table: &str) -> Result<u64> {
        self.begin(snapshot).await?;
        let count = self.count(table).await;
        self.end(count).await
    }

    async fn count(&self, table: &str) -> Result<u64> {
        if let Some(estimate) = catalog::estimate(&self.client, &self.schema, table).await? {
            return Ok(estimate);
        }

        let row = self
            .client
            .query_one(
                &format!("SELECT count(*) FROM {}", sql::table(&self.schema, table)),
                &[],
            )
            .await
            .map_err(|err| table_error(table, err))?;
        let count: i64 = row.try_get(0).map_err(driver_error)?;
        Ok(count.max(0) as u64)
    }

    async fn split_points(&self, snapshot: &Snapshot, op: SplitPoints) -> Result<Vec<Key>> {
        if op.count < 2 || !sql::is_splittable(&op.key) {
            return Ok(vec![]);
        }

        let buckets = i32::try_from(op.count).unwrap_or(i32::MAX);
        let query = sql::split_points(&self.schema, &op.table, &op.key[0]);

        self.begin(snapshot).await?;
        let rows = self
            .client
            .query(&query, &[&buckets])
            .await
            .map_err(|err| table_error(&op.table, err));
        let rows = self.end(rows).await?;

        // The first bucket starts at the beginning of the key space.
        rows.iter()
            .skip(1)
            .map(|row| value::decode(row, 0).map(Key::from))
            .collect()
    }

    async fn read_shard(&self, snapshot: &Snapshot, op: ReadShard) -> Result<ValueStream> {
        let (query, params) =
            sql::read_shard(&self.schema, &op.table, &op.columns, &op.key, &op.range);

        self.begin(snapshot).await?;
        self.reading.store(true, Ordering::Release);

        let rows = self
            .client
            .query_raw(&query, params.iter().map(|param| param as &dyn ToSql))
            .await
            .map_err(|err| table_error(&op.table, err));

        let rows = match rows {
            Ok(rows) => rows,
            Err(err) => {
                self.reading.store(false, Ordering::Release);
                let _ = self.client.batch_execute(transaction::ROLLBACK).await;
                return Err(err);
            }
        };

        let client = self.client.clone();
        let reading = self.reading.clone();
        let table = op.table;

        Ok(ValueStream::from_stream(async_stream::try_stream! {
            let mut rows = Box::pin(rows);

            while let Some(row) = rows.next().await {
                let row = row.map_err(|err| table_error(&table, err))?;
                yield value::decode_row(&row)?;
            }

            if reading.swap(false, Ordering::AcqRel) {
                client
                    .batch_execute(transaction::COMMIT)
                    .await
                    .map_err(driver_error)?;
            }
        }))
    }
}

#[async_trait]
impl dbexport_core::Connection for Connection {
    fn capability(&self) -> &'static Capability {
        &Capability::POSTGRESQL
    }

    async fn exec(&mut self, snapshot: &Snapshot, op: Operation) -> Result<Response> {
        self.reset().await?;

        match op {
            Operation::ReadCatalog(_) => Ok(Response::Catalog(self.read_catalog(snapshot).await?)),
            Operation::DescribeObject(op) => self.describe(&op.name).await,
            Operation::EstimateRows(op) => {
                Ok(Response::Count(self.estimate_rows(snapshot, &op.table).await?))
            }
            Operation::SplitPoints(op) => Ok(Response::Keys(self.split_points(snapshot, op).await?)),
            Operation::ReadShard(op) => Ok(Response::Rows(self.read_shard(snapshot, op).await?)),
        }
    }
}
