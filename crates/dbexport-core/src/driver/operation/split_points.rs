use super::Operation;
use crate::schema::Field;

#[derive(Debug, Clone)]
pub struct SplitPoints {
    /// Table to split
    pub table: String,

    /// Primary key columns, in key order
    pub key: Vec<Field>,

    /// Desired number of ranges. The driver returns at most `count - 1`
    /// points and may return fewer, including none.
    pub count: usize,
}

impl From<SplitPoints> for Operation {
    fn from(value: SplitPoints) -> Self {
        Self::SplitPoints(value)
    }
}
