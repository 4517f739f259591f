mod object;
mod retry;
mod shard;

use retry::Exhausted;

use crate::{
    catalog::CatalogReader,
    manifest::Manifest,
    report::{ObjectFailure, RunReport},
    ExportConfig, Pool, Result,
};

use dbexport_core::{
    driver::{Driver, Snapshot},
    Dialect, Error,
};
use std::{future::Future, sync::Arc, time::Duration};
use tokio::{sync::Semaphore, task::JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

/// Runs snapshot exports against one database.
#[derive(Debug, Clone)]
pub struct Exporter {
    driver: Arc<dyn Driver>,
    config: Arc<ExportConfig>,
}

/// State shared by every task of one run.
#[derive(Debug)]
struct RunContext {
    config: Arc<ExportConfig>,
    pool: Pool,
    snapshot: Snapshot,
    dialect: Dialect,
    manifest: Manifest,

    /// Bounds the shards being written at the same time.
    permits: Arc<Semaphore>,

    cancel: CancellationToken,
}

impl Exporter {
    pub fn new(driver: impl Driver, config: ExportConfig) -> Self {
        Self::from_shared(Arc::new(driver), config)
    }

    pub fn from_shared(driver: Arc<dyn Driver>, config: ExportConfig) -> Self {
        Self {
            driver,
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Exports every object of the database.
    ///
    /// Object failures are reported, not returned: the run keeps going for
    /// the other objects. Cancelling `cancel`, or reaching the configured
    /// deadline, stops every in-flight shard, discards partial files and
    /// fails the run without writing a manifest.
    pub async fn run(&self, cancel: CancellationToken) -> RunReport {
        let run_id = Uuid::new_v4();
        let run_cancel = cancel.child_token();

        info!(
            %run_id,
            output_dir = %self.config.output_dir.display(),
            snapshot = ?self.config.snapshot,
            "starting export"
        );

        let deadline = self.config.deadline;
        let timer = async move {
            match deadline {
                Some(deadline) => {
                    tokio::time::sleep(deadline).await;
                    deadline
                }
                None => std::future::pending::<Duration>().await,
            }
        };

        let work = self.export(run_id, &run_cancel);
        tokio::pin!(work);

        let report = tokio::select! {
            report = &mut work => report,
            elapsed = timer => {
                run_cancel.cancel();
                // Let every task observe the cancellation and clean up.
                let drained = work.await;
                RunReport::failed(run_id, drained.snapshot, Error::timeout(elapsed))
            }
        };

        match &report.error {
            Some(err) => warn!(%run_id, error = %err, "export failed"),
            None => info!(
                %run_id,
                status = %report.status,
                failed = report.failures.len(),
                "export finished"
            ),
        }

        report
    }

    async fn export(&self, run_id: Uuid, cancel: &CancellationToken) -> RunReport {
        let pool = match Pool::new(self.driver.clone(), self.config.max_concurrency) {
            Ok(pool) => pool,
            Err(err) => return RunReport::failed(run_id, None, err),
        };

        let snapshot = match cancellable(cancel, self.driver.snapshot(&self.config.snapshot)).await
        {
            Ok(snapshot) => snapshot,
            Err(err) if err.is_cancelled() => return RunReport::failed(run_id, None, err),
            Err(err) => {
                return RunReport::failed(run_id, None, err.context(Error::snapshot_acquisition()))
            }
        };
        let token = snapshot.token().to_string();
        info!(%run_id, snapshot = %token, "acquired snapshot");

        let catalog = {
            let reader = CatalogReader::new(&pool, &snapshot);
            let catalog = retry::retry(&self.config, cancel, |_| {
                cancellable(cancel, reader.read())
            })
            .await
            .map_err(Exhausted::into_error);

            match catalog {
                Ok(catalog) => catalog,
                Err(err) => return RunReport::failed(run_id, Some(token), err),
            }
        };
        info!(%run_id, objects = catalog.len(), dialect = %catalog.dialect, "read catalog");

        if let Err(err) = tokio::fs::create_dir_all(&self.config.output_dir).await {
            return RunReport::failed(run_id, Some(token), err.into());
        }

        let ctx = Arc::new(RunContext {
            config: self.config.clone(),
            pool,
            snapshot,
            dialect: catalog.dialect,
            manifest: Manifest::new(),
            permits: Arc::new(Semaphore::new(self.config.max_concurrency.max(1))),
            cancel: cancel.clone(),
        });

        let objects = catalog.objects.len();
        let mut tasks = JoinSet::new();

        for object in catalog.objects {
            ctx.manifest.register(&object.name, object.kind_name());
            let ctx = ctx.clone();
            tasks.spawn(async move {
                let result = object::export_object(&ctx, &object).await;
                (object.name, result)
            });
        }

        let mut failures = vec![];

        while let Some(joined) = tasks.join_next().await {
            let (object, result) = match joined {
                Ok(done) => done,
                Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
                Err(err) => {
                    warn!(error = %err, "object task did not finish");
                    continue;
                }
            };

            match result {
                Ok(()) => {}
                Err(err) if err.is_cancelled() => {}
                Err(error) => failures.push(ObjectFailure { object, error }),
            }
        }

        if cancel.is_cancelled() {
            return RunReport::failed(run_id, Some(token), Error::cancelled());
        }

        failures.sort_by(|a, b| a.object.cmp(&b.object));

        let manifest = ctx.manifest.finish(run_id, ctx.dialect, &token);
        let manifest_path = match manifest.write_to(&self.config.output_dir).await {
            Ok(path) => path,
            Err(err) => return RunReport::failed(run_id, Some(token), err),
        };

        RunReport {
            run_id,
            status: RunReport::status_for(objects, failures.len()),
            snapshot: Some(token),
            error: None,
            failures,
            manifest: Some(manifest),
            manifest_path: Some(manifest_path),
        }
    }
}

/// Resolves to a cancelled error as soon as `cancel` fires.
async fn cancellable<T>(
    cancel: &CancellationToken,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Error::cancelled()),
        result = fut => result,
    }
}
