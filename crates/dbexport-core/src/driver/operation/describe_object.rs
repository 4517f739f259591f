use super::Operation;

#[derive(Debug, Clone)]
pub struct DescribeObject {
    /// Name of the object to look up
    pub name: String,
}

impl From<DescribeObject> for Operation {
    fn from(value: DescribeObject) -> Self {
        Self::DescribeObject(value)
    }
}
