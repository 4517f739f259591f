use super::Operation;
use crate::{schema::Field, stmt::KeyRange};

#[derive(Debug, Clone)]
pub struct ReadShard {
    /// Table to read
    pub table: String,

    /// Columns to return, in output order
    pub columns: Vec<Field>,

    /// Primary key columns, in key order
    pub key: Vec<Field>,

    /// Keys to read
    pub range: KeyRange,
}

impl From<ReadShard> for Operation {
    fn from(value: ReadShard) -> Self {
        Self::ReadShard(value)
    }
}
