use super::Operation;

#[derive(Debug, Clone)]
pub struct EstimateRows {
    /// Table to estimate
    pub table: String,
}

impl From<EstimateRows> for Operation {
    fn from(value: EstimateRows) -> Self {
        Self::EstimateRows(value)
    }
}
