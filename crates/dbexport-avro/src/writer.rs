//! Shard files: one Avro object container file per shard, written by a
//! blocking task fed through a bounded channel.
//!
//! Rows land in a hidden `.<name>.inprogress` file next to the final one.
//! [`ShardFile::commit`] renames it into place; any other ending deletes it,
//! so a reader listing the output directory never sees a partial file.

use crate::{encode_record, OutputSchema, METADATA_OBJECT, METADATA_SCHEMA};

use dbexport_core::{stmt::ValueRecord, Error, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::debug;

/// Block compression of the container files.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Codec {
    #[default]
    Null,
    Deflate,
}

impl Codec {
    pub fn as_str(self) -> &'static str {
        match self {
            Codec::Null => "null",
            Codec::Deflate => "deflate",
        }
    }

    fn to_avro(self) -> Result<apache_avro::Codec> {
        self.as_str()
            .parse::<apache_avro::Codec>()
            .map_err(|_| dbexport_core::err!("codec `{}` is not available", self.as_str()))
    }
}

impl std::str::FromStr for Codec {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "null" | "none" => Ok(Codec::Null),
            "deflate" => Ok(Codec::Deflate),
            _ => dbexport_core::bail!("unknown codec `{s}`"),
        }
    }
}

/// Where and how to write one shard.
#[derive(Debug, Clone)]
pub struct ShardFileOptions {
    pub dir: PathBuf,

    /// Final file name, inside `dir`
    pub file_name: String,

    /// Shard index, for error attribution
    pub shard: usize,

    /// Extra user metadata; the object name and schema document are always
    /// included.
    pub metadata: Vec<(String, String)>,

    pub codec: Codec,
}

/// A committed shard file.
#[derive(Debug, Clone, PartialEq)]
pub struct Written {
    pub path: PathBuf,
    pub file_name: String,
    pub records: u64,
    pub bytes: u64,
}

/// Handle to a shard file being written.
///
/// Dropping the handle without committing discards the file.
#[derive(Debug)]
pub struct ShardFile {
    tx: Option<mpsc::Sender<Message>>,
    task: Option<JoinHandle<Result<Written>>>,
    object: String,
    shard: usize,
}

#[derive(Debug)]
enum Message {
    Row(ValueRecord),
    Commit,
}

impl ShardFile {
    /// Starts the writer task. Must be called from within a tokio runtime.
    pub fn create(schema: Arc<OutputSchema>, options: ShardFileOptions, capacity: usize) -> ShardFile {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let object = schema.object().to_string();
        let shard = options.shard;

        let task = tokio::task::spawn_blocking(move || write_shard(&schema, &options, rx));

        ShardFile {
            tx: Some(tx),
            task: Some(task),
            object,
            shard,
        }
    }

    /// Queues a row, waiting while the channel is full.
    pub async fn append(&mut self, row: ValueRecord) -> Result<()> {
        let Some(tx) = &self.tx else {
            return Err(self.finished());
        };

        if tx.send(Message::Row(row)).await.is_ok() {
            return Ok(());
        }

        // The writer stopped early; its result carries the reason.
        self.tx = None;
        match self.join().await {
            Err(err) => Err(err),
            Ok(_) => Err(self.finished()),
        }
    }

    /// Flushes the file and moves it to its final name.
    pub async fn commit(mut self) -> Result<Written> {
        if let Some(tx) = self.tx.take() {
            // A send error means the writer already stopped; join reports why.
            let _ = tx.send(Message::Commit).await;
        }
        self.join().await
    }

    /// Stops the writer and deletes the in-progress file.
    pub async fn abort(mut self) {
        self.tx = None;
        if let Err(err) = self.join().await {
            if !err.is_cancelled() {
                debug!(object = %self.object, shard = self.shard, error = %err, "shard writer failed before abort");
            }
        }
    }

    async fn join(&mut self) -> Result<Written> {
        let Some(task) = self.task.take() else {
            return Err(self.finished());
        };

        match task.await {
            Ok(result) => result,
            Err(err) => Err(anyhow::Error::from(err).into()),
        }
    }

    fn finished(&self) -> Error {
        dbexport_core::err!(
            "shard writer already finished: object={} shard={}",
            self.object,
            self.shard
        )
    }
}

fn write_shard(
    schema: &OutputSchema,
    options: &ShardFileOptions,
    rx: mpsc::Receiver<Message>,
) -> Result<Written> {
    let path = options.dir.join(&options.file_name);
    let temp = options.dir.join(format!(".{}.inprogress", options.file_name));

    let result = write_temp(schema, options, &temp, rx).and_then(|records| {
        fs::rename(&temp, &path)?;
        let bytes = fs::metadata(&path)?.len();
        Ok(Written {
            path,
            file_name: options.file_name.clone(),
            records,
            bytes,
        })
    });

    match result {
        Ok(written) => {
            debug!(
                object = schema.object(),
                shard = options.shard,
                file = %written.file_name,
                rows = written.records,
                "committed shard file"
            );
            Ok(written)
        }
        Err(err) => {
            if let Err(remove) = fs::remove_file(&temp) {
                if remove.kind() != std::io::ErrorKind::NotFound {
                    debug!(path = %temp.display(), error = %remove, "failed to remove in-progress file");
                }
            }

            if err.is_cancelled() {
                Err(err)
            } else {
                Err(err.context(Error::write(schema.object(), options.shard)))
            }
        }
    }
}

fn write_temp(
    schema: &OutputSchema,
    options: &ShardFileOptions,
    temp: &Path,
    mut rx: mpsc::Receiver<Message>,
) -> Result<u64> {
    let file = fs::File::create(temp)?;
    let mut writer =
        apache_avro::Writer::with_codec(schema.avro(), BufWriter::new(file), options.codec.to_avro()?);

    writer
        .add_user_metadata(METADATA_OBJECT.to_string(), schema.object())
        .map_err(avro_error)?;
    writer
        .add_user_metadata(METADATA_SCHEMA.to_string(), schema.document())
        .map_err(avro_error)?;
    for (key, value) in &options.metadata {
        writer
            .add_user_metadata(key.clone(), value)
            .map_err(avro_error)?;
    }

    let mut records = 0;

    loop {
        match rx.blocking_recv() {
            Some(Message::Row(row)) => {
                let value = encode_record(schema, row)?;
                writer.append(value).map_err(avro_error)?;
                records += 1;
            }
            Some(Message::Commit) => break,
            None => return Err(Error::cancelled()),
        }
    }

    // `into_inner` writes the header even when no record was appended.
    let mut out = writer.into_inner().map_err(avro_error)?;
    out.flush()?;
    out.get_ref().sync_all()?;

    Ok(records)
}

fn avro_error(err: apache_avro::Error) -> Error {
    anyhow::Error::from(err).into()
}
