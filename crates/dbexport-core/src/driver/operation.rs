mod describe_object;
pub use describe_object::DescribeObject;

mod estimate_rows;
pub use estimate_rows::EstimateRows;

mod read_catalog;
pub use read_catalog::ReadCatalog;

mod read_shard;
pub use read_shard::ReadShard;

mod split_points;
pub use split_points::SplitPoints;

#[derive(Debug, Clone)]
pub enum Operation {
    /// Read every exportable object as of the snapshot
    ReadCatalog(ReadCatalog),

    /// Look up one object's latest definition, to detect drift
    DescribeObject(DescribeObject),

    /// Approximate row count of a table
    EstimateRows(EstimateRows),

    /// Primary key values that split a table into roughly even ranges
    SplitPoints(SplitPoints),

    /// Stream the rows of one key range of a table
    ReadShard(ReadShard),
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::ReadCatalog(_) => "read_catalog",
            Operation::DescribeObject(_) => "describe_object",
            Operation::EstimateRows(_) => "estimate_rows",
            Operation::SplitPoints(_) => "split_points",
            Operation::ReadShard(_) => "read_shard",
        }
    }
}
