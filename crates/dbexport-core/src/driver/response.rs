use crate::{
    bail,
    schema::{Catalog, Object},
    stmt::{Key, ValueStream},
    Result,
};

#[derive(Debug)]
pub enum Response {
    /// Result of [`ReadCatalog`](super::operation::ReadCatalog)
    Catalog(Catalog),

    /// Result of [`DescribeObject`](super::operation::DescribeObject);
    /// `None` when the object no longer exists
    Object(Option<Object>),

    /// Result of [`EstimateRows`](super::operation::EstimateRows)
    Count(u64),

    /// Result of [`SplitPoints`](super::operation::SplitPoints)
    Keys(Vec<Key>),

    /// Result of [`ReadShard`](super::operation::ReadShard)
    Rows(ValueStream),
}

impl Response {
    pub fn into_catalog(self) -> Result<Catalog> {
        match self {
            Response::Catalog(catalog) => Ok(catalog),
            other => bail!("invalid driver response: expected Catalog, got {}", other.name()),
        }
    }

    pub fn into_object(self) -> Result<Option<Object>> {
        match self {
            Response::Object(object) => Ok(object),
            other => bail!("invalid driver response: expected Object, got {}", other.name()),
        }
    }

    pub fn into_count(self) -> Result<u64> {
        match self {
            Response::Count(count) => Ok(count),
            other => bail!("invalid driver response: expected Count, got {}", other.name()),
        }
    }

    pub fn into_keys(self) -> Result<Vec<Key>> {
        match self {
            Response::Keys(keys) => Ok(keys),
            other => bail!("invalid driver response: expected Keys, got {}", other.name()),
        }
    }

    pub fn into_rows(self) -> Result<ValueStream> {
        match self {
            Response::Rows(rows) => Ok(rows),
            other => bail!("invalid driver response: expected Rows, got {}", other.name()),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Response::Catalog(_) => "Catalog",
            Response::Object(_) => "Object",
            Response::Count(_) => "Count",
            Response::Keys(_) => "Keys",
            Response::Rows(_) => "Rows",
        }
    }
}
