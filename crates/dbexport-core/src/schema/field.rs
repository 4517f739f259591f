/// A column of a table, or a column of a model's input/output group.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// The name of the column in the source database.
    pub name: String,

    /// The source type string, verbatim as the catalog spells it.
    pub sql_type: String,

    /// Whether or not the column is nullable
    pub nullable: bool,

    /// Hidden columns are excluded from `SELECT *` in the source database.
    pub hidden: bool,

    /// Set when the column is computed from other columns.
    pub generated: Option<Generated>,

    /// Column options, e.g. `required=TRUE` on a model column.
    pub options: Vec<String>,

    /// A named group of columns standing in for the type string. Only model
    /// `Input` and `Output` groups use this; struct-typed table columns
    /// describe their members through `sql_type`.
    pub nested: Option<NestedStruct>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Generated {
    pub expression: String,

    /// Stored generated columns hold data and are read like any other
    /// column. Virtual ones have no readable value.
    pub stored: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NestedStruct {
    pub fields: Vec<Field>,
}

impl Field {
    /// A nullable, visible, non-generated column.
    pub fn new(name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql_type: sql_type.into(),
            nullable: true,
            hidden: false,
            generated: None,
            options: vec![],
            nested: None,
        }
    }

    /// A group of columns presented as a single struct-typed field.
    ///
    /// The field's type string is the `STRUCT<...>` spelling of the member
    /// columns, built from their verbatim type strings.
    pub fn group(name: impl Into<String>, fields: Vec<Field>) -> Self {
        let members = fields
            .iter()
            .map(|field| format!("{} {}", field.name, field.sql_type))
            .collect::<Vec<_>>()
            .join(", ");

        Self {
            sql_type: format!("STRUCT<{members}>"),
            nullable: false,
            nested: Some(NestedStruct { fields }),
            ..Self::new(name, String::new())
        }
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn generated(mut self, expression: impl Into<String>, stored: bool) -> Self {
        self.generated = Some(Generated {
            expression: expression.into(),
            stored,
        });
        self
    }

    pub fn option(mut self, option: impl Into<String>) -> Self {
        self.options.push(option.into());
        self
    }

    /// True when the column has row data to read. Virtual generated columns
    /// are schema-only.
    pub fn is_readable(&self) -> bool {
        !matches!(self.generated, Some(Generated { stored: false, .. }))
    }
}
