use dbexport_avro::Codec;
use dbexport_core::driver::TimestampBound;

use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};

/// Options of one export run.
///
/// Every field has a default, so a JSON configuration only needs to name
/// the options it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExportConfig {
    /// Directory the Avro files and the manifest are written to.
    pub output_dir: PathBuf,

    /// Avro namespace of the synthesized record schemas.
    pub namespace: String,

    /// Maximum number of shards read at the same time. Also bounds the
    /// number of open database sessions.
    pub max_concurrency: usize,

    /// Attempts per shard read (and per planning query) before the object
    /// fails.
    pub max_attempts: u32,

    /// Delay before the first retry. Doubles on every further retry.
    pub initial_backoff: Duration,

    /// Upper bound of the retry delay.
    pub max_backoff: Duration,

    /// Target number of rows per shard.
    pub rows_per_shard: u64,

    /// Upper bound of the number of shards of one table.
    pub max_shards_per_table: usize,

    pub codec: Codec,

    /// Bound on the whole run, if any.
    pub deadline: Option<Duration>,

    /// The point in time to read at.
    pub snapshot: TimestampBound,

    /// Rows buffered between a shard reader and its file writer.
    pub channel_capacity: usize,
}

impl ExportConfig {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            ..Self::default()
        }
    }

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency;
        self
    }

    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn backoff(mut self, initial: Duration, max: Duration) -> Self {
        self.initial_backoff = initial;
        self.max_backoff = max;
        self
    }

    pub fn rows_per_shard(mut self, rows_per_shard: u64) -> Self {
        self.rows_per_shard = rows_per_shard;
        self
    }

    pub fn max_shards_per_table(mut self, max_shards_per_table: usize) -> Self {
        self.max_shards_per_table = max_shards_per_table;
        self
    }

    pub fn codec(mut self, codec: Codec) -> Self {
        self.codec = codec;
        self
    }

    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn snapshot(mut self, snapshot: TimestampBound) -> Self {
        self.snapshot = snapshot;
        self
    }

    pub fn channel_capacity(mut self, channel_capacity: usize) -> Self {
        self.channel_capacity = channel_capacity;
        self
    }

    /// Loads a configuration from a JSON document.
    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./export"),
            namespace: "dbexport".to_string(),
            max_concurrency: 8,
            max_attempts: 5,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(10),
            rows_per_shard: 100_000,
            max_shards_per_table: 64,
            codec: Codec::Null,
            deadline: None,
            snapshot: TimestampBound::Strong,
            channel_capacity: 1024,
        }
    }
}
