use super::{
    cancellable,
    retry::{self, Exhausted},
    RunContext,
};
use crate::{plan::ShardPlan, Result};

use dbexport_avro::{OutputSchema, ShardFile, ShardFileOptions, Written, METADATA_SNAPSHOT};
use dbexport_core::{
    driver::operation::ReadShard,
    schema::Field,
    stmt::ValueStream,
    Error,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// What to read for every shard of one table.
#[derive(Debug)]
pub(super) struct ReadPlan {
    pub(super) table: String,

    /// Readable columns, in schema order
    pub(super) columns: Vec<Field>,

    /// Primary key columns, in key order
    pub(super) key: Vec<Field>,
}

/// Reads one shard into its file and records the file in the manifest.
///
/// `read` is `None` for objects without rows, which get an empty file.
pub(super) async fn export_shard(
    ctx: &RunContext,
    schema: &std::sync::Arc<OutputSchema>,
    read: Option<&ReadPlan>,
    shard: &ShardPlan,
    cancel: &CancellationToken,
) -> Result<()> {
    let _permit = cancellable(cancel, async {
        ctx.permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| Error::cancelled())
    })
    .await?;

    let written = retry::retry(&ctx.config, cancel, |attempt| {
        attempt_shard(ctx, schema, read, shard, cancel, attempt)
    })
    .await
    .map_err(|exhausted| shard_error(schema.object(), shard.index, exhausted))?;

    ctx.manifest.record_file(schema.object(), shard.index, &written);
    info!(
        object = schema.object(),
        shard = shard.index,
        rows = written.records,
        file = %written.file_name,
        "exported shard"
    );

    Ok(())
}

async fn attempt_shard(
    ctx: &RunContext,
    schema: &std::sync::Arc<OutputSchema>,
    read: Option<&ReadPlan>,
    shard: &ShardPlan,
    cancel: &CancellationToken,
    attempt: u32,
) -> Result<Written> {
    let options = ShardFileOptions {
        dir: ctx.config.output_dir.clone(),
        file_name: shard.file_name(schema.object()),
        shard: shard.index,
        metadata: vec![(
            METADATA_SNAPSHOT.to_string(),
            ctx.snapshot.token().to_string(),
        )],
        codec: ctx.config.codec,
    };

    let Some(read) = read else {
        let file = ShardFile::create(schema.clone(), options, ctx.config.channel_capacity);
        return file.commit().await;
    };

    debug!(object = %read.table, shard = shard.index, attempt, range = ?shard.range, "reading shard");

    let mut connection = cancellable(cancel, ctx.pool.get()).await?;

    let rows = cancellable(cancel, async {
        connection
            .exec(
                &ctx.snapshot,
                ReadShard {
                    table: read.table.clone(),
                    columns: read.columns.clone(),
                    key: read.key.clone(),
                    range: shard.range.clone(),
                }
                .into(),
            )
            .await?
            .into_rows()
    })
    .await;

    let mut rows = match rows {
        Ok(rows) => rows,
        Err(err) => {
            if err.is_transient() {
                connection.discard();
            }
            return Err(err);
        }
    };

    let mut file = ShardFile::create(schema.clone(), options, ctx.config.channel_capacity);

    match pump(&mut rows, &mut file, cancel).await {
        Ok(()) => file.commit().await,
        Err(err) => {
            file.abort().await;
            if err.is_transient() {
                connection.discard();
            }
            Err(err)
        }
    }
}

async fn pump(
    rows: &mut ValueStream,
    file: &mut ShardFile,
    cancel: &CancellationToken,
) -> Result<()> {
    loop {
        let row = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Error::cancelled()),
            row = rows.next() => row,
        };

        match row {
            Some(row) => file.append(row?).await?,
            None => return Ok(()),
        }
    }
}

fn shard_error(object: &str, shard: usize, exhausted: Exhausted) -> Error {
    let Exhausted { error, attempts } = exhausted;

    if error.is_cancelled()
        || error.is_catalog_drift()
        || error.is_write()
        || error.is_unsupported_type()
    {
        return error;
    }

    error.context(Error::shard_read(object, shard, attempts))
}
