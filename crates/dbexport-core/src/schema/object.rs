use super::Field;

/// An exportable, schema-bearing entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Object {
    /// Name of the object in the source catalog.
    pub name: String,

    pub kind: ObjectKind,

    /// Top-level fields, in declaration order. A model has exactly two:
    /// `Input` and `Output`. A search index has none.
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ObjectKind {
    Table {
        /// Primary key column names, in key order.
        primary_key: Vec<String>,
    },
    Model,
    SearchIndex {
        /// The table whose tokenized columns the index covers.
        table: String,

        /// The indexed columns of `table`.
        columns: Vec<String>,
    },
}

impl Object {
    pub fn table(name: impl Into<String>, fields: Vec<Field>, primary_key: Vec<String>) -> Self {
        Self {
            name: name.into(),
            kind: ObjectKind::Table { primary_key },
            fields,
        }
    }

    pub fn model(name: impl Into<String>, input: Vec<Field>, output: Vec<Field>) -> Self {
        Self {
            name: name.into(),
            kind: ObjectKind::Model,
            fields: vec![Field::group("Input", input), Field::group("Output", output)],
        }
    }

    pub fn search_index(
        name: impl Into<String>,
        table: impl Into<String>,
        columns: Vec<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: ObjectKind::SearchIndex {
                table: table.into(),
                columns,
            },
            fields: vec![],
        }
    }

    pub fn is_table(&self) -> bool {
        matches!(self.kind, ObjectKind::Table { .. })
    }

    /// Objects that never have rows of their own: models and search indexes.
    pub fn is_schema_only(&self) -> bool {
        !self.is_table()
    }

    pub fn primary_key(&self) -> &[String] {
        match &self.kind {
            ObjectKind::Table { primary_key } => primary_key,
            _ => &[],
        }
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// The tag recorded in output schemas and the manifest.
    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            ObjectKind::Table { .. } => "TABLE",
            ObjectKind::Model => "MODEL",
            ObjectKind::SearchIndex { .. } => "SEARCH_INDEX",
        }
    }
}
