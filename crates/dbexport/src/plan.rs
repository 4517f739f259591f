//! Shard planning: how many shards a table gets and which keys each covers.

use dbexport_core::stmt::{Key, KeyRange};

/// One shard of an object.
#[derive(Debug, Clone, PartialEq)]
pub struct ShardPlan {
    /// Position of the shard, `0..count`
    pub index: usize,

    /// Number of shards of the object
    pub count: usize,

    pub range: KeyRange,
}

impl ShardPlan {
    /// The final name of the shard's file.
    pub fn file_name(&self, object: &str) -> String {
        file_name(object, self.index, self.count)
    }
}

/// Number of shards to request for a table of `estimated_rows` rows.
///
/// Never less than one, never more than `max_shards`.
pub fn shard_count(estimated_rows: u64, rows_per_shard: u64, max_shards: usize) -> usize {
    let wanted = estimated_rows.div_ceil(rows_per_shard.max(1));
    let wanted = usize::try_from(wanted).unwrap_or(usize::MAX);
    wanted.clamp(1, max_shards.max(1))
}

/// Builds the shards covering the whole key space, cut at `split_points`.
///
/// The shards are disjoint, in key order, and together cover every key.
pub fn plan_shards(split_points: Vec<Key>) -> Vec<ShardPlan> {
    let ranges = KeyRange::partition(split_points);
    let count = ranges.len();

    ranges
        .into_iter()
        .enumerate()
        .map(|(index, range)| ShardPlan {
            index,
            count,
            range,
        })
        .collect()
}

/// The single shard of an object without rows of its own, or of an empty
/// table.
pub fn single_shard() -> ShardPlan {
    ShardPlan {
        index: 0,
        count: 1,
        range: KeyRange::full(),
    }
}

/// `<object>.avro-<index>-of-<count>`, both numbers zero-padded to five
/// digits.
pub fn file_name(object: &str, index: usize, count: usize) -> String {
    let object: String = object
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | '\0') { '_' } else { c })
        .collect();
    format!("{object}.avro-{index:05}-of-{count:05}")
}
