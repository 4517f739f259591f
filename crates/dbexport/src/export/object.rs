use super::{
    cancellable,
    retry::{self, Exhausted},
    shard::{self, ReadPlan},
    RunContext,
};
use crate::{catalog::CatalogReader, plan, Result};

use dbexport_avro::OutputSchema;
use dbexport_core::{
    driver::operation::{EstimateRows, SplitPoints},
    err,
    schema::{Field, Object},
    Error,
};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Exports one object and records its terminal state in the manifest.
pub(super) async fn export_object(ctx: &Arc<RunContext>, object: &Object) -> Result<()> {
    let result = export(ctx, object).await;

    match &result {
        Ok(()) => {
            ctx.manifest.complete(&object.name);
            info!(object = %object.name, kind = object.kind_name(), "object exported");
        }
        Err(err) if err.is_cancelled() => {}
        Err(err) => {
            ctx.manifest.fail(&object.name, err);
            warn!(object = %object.name, error = %err, "object export failed");
        }
    }

    result
}

async fn export(ctx: &Arc<RunContext>, object: &Object) -> Result<()> {
    // The schema exists before the first row of the object is read.
    let schema = Arc::new(OutputSchema::synthesize(
        object,
        ctx.dialect,
        &ctx.config.namespace,
    )?);
    debug!(object = %object.name, record = schema.record_name(), "synthesized schema");

    let (read, shards) = if object.is_table() {
        let read = Arc::new(ReadPlan {
            table: object.name.clone(),
            columns: schema.readable_fields(),
            key: key_fields(object)?,
        });
        let shards = plan_table(ctx, &read).await?;
        (Some(read), shards)
    } else {
        (None, vec![plan::single_shard()])
    };

    debug!(object = %object.name, shards = shards.len(), "planned shards");

    // Siblings of a failed shard stop early; other objects are unaffected.
    let object_cancel = ctx.cancel.child_token();
    let mut tasks = JoinSet::new();

    for shard in shards {
        let ctx = ctx.clone();
        let schema = schema.clone();
        let read = read.clone();
        let cancel = object_cancel.clone();
        tasks.spawn(async move {
            shard::export_shard(&ctx, &schema, read.as_deref(), &shard, &cancel).await
        });
    }

    let mut first_error: Option<Error> = None;

    while let Some(joined) = tasks.join_next().await {
        let result = match joined {
            Ok(result) => result,
            Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
            Err(err) => Err(anyhow::Error::from(err).into()),
        };

        if let Err(err) = result {
            object_cancel.cancel();

            // Keep the root cause rather than the cancellations it caused.
            let replace = match &first_error {
                None => true,
                Some(first) => first.is_cancelled() && !err.is_cancelled(),
            };
            if replace {
                first_error = Some(err);
            }
        }
    }

    if let Some(err) = first_error {
        return Err(err);
    }

    let catalog = CatalogReader::new(&ctx.pool, &ctx.snapshot);
    let cancel = &ctx.cancel;
    retry::retry(&ctx.config, cancel, |_| cancellable(cancel, catalog.verify(object)))
    .await
    .map_err(Exhausted::into_error)
}

fn key_fields(object: &Object) -> Result<Vec<Field>> {
    object
        .primary_key()
        .iter()
        .map(|name| {
            object
                .field(name)
                .cloned()
                .ok_or_else(|| err!("primary key column `{name}` of `{}` not found", object.name))
        })
        .collect()
}

async fn plan_table(ctx: &RunContext, read: &ReadPlan) -> Result<Vec<plan::ShardPlan>> {
    // Without a key there is nothing to split on.
    if read.key.is_empty() {
        return Ok(vec![plan::single_shard()]);
    }

    let estimate = retry::retry(&ctx.config, &ctx.cancel, |_| {
        cancellable(&ctx.cancel, async move {
            let mut connection = ctx.pool.get().await?;
            connection
                .exec(
                    &ctx.snapshot,
                    EstimateRows {
                        table: read.table.clone(),
                    }
                    .into(),
                )
                .await?
                .into_count()
        })
    })
    .await
    .map_err(|exhausted| planning_error(&read.table, exhausted))?;

    let count = plan::shard_count(
        estimate,
        ctx.config.rows_per_shard,
        ctx.config.max_shards_per_table,
    );
    debug!(object = %read.table, estimate, count, "estimated rows");

    if count == 1 {
        return Ok(vec![plan::single_shard()]);
    }

    let points = retry::retry(&ctx.config, &ctx.cancel, |_| {
        cancellable(&ctx.cancel, async move {
            let mut connection = ctx.pool.get().await?;
            connection
                .exec(
                    &ctx.snapshot,
                    SplitPoints {
                        table: read.table.clone(),
                        key: read.key.clone(),
                        count,
                    }
                    .into(),
                )
                .await?
                .into_keys()
        })
    })
    .await
    .map_err(|exhausted| planning_error(&read.table, exhausted))?;

    Ok(plan::plan_shards(points))
}

fn planning_error(table: &str, exhausted: Exhausted) -> Error {
    let Exhausted { error, attempts } = exhausted;
    if error.is_cancelled() || error.is_catalog_drift() {
        return error;
    }
    error.context(err!(
        "failed to plan shards: object={table} attempts={attempts}"
    ))
}
