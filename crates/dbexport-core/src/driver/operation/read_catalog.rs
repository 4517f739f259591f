use super::Operation;

#[derive(Debug, Clone, Default)]
pub struct ReadCatalog {}

impl From<ReadCatalog> for Operation {
    fn from(value: ReadCatalog) -> Self {
        Self::ReadCatalog(value)
    }
}
