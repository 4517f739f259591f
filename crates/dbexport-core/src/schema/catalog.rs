use super::{Dialect, Object};

/// Every exportable object of one database, as of one snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    pub dialect: Dialect,

    /// Objects in catalog order: tables, then models, then search indexes,
    /// each group ordered by name.
    pub objects: Vec<Object>,
}

impl Catalog {
    pub fn new(dialect: Dialect, objects: Vec<Object>) -> Self {
        Self { dialect, objects }
    }

    pub fn object(&self, name: &str) -> Option<&Object> {
        self.objects.iter().find(|object| object.name == name)
    }

    pub fn tables(&self) -> impl Iterator<Item = &Object> + '_ {
        self.objects.iter().filter(|object| object.is_table())
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}
