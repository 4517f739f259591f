use crate::schema::Dialect;

#[derive(Debug)]
pub struct Capability {
    /// The SQL dialect column types are spelled in.
    pub dialect: Dialect,

    /// Columns may be declared with `STRUCT<...>` types.
    pub structs: bool,

    /// The catalog can contain model objects.
    pub models: bool,

    /// The catalog can contain search index objects.
    pub search_indexes: bool,

    /// Columns can be declared `HIDDEN`.
    pub hidden_columns: bool,
}

impl Capability {
    /// GoogleSQL-style standard dialect capabilities.
    pub const GOOGLE_STANDARD_SQL: Self = Self {
        dialect: Dialect::GoogleStandardSql,
        structs: true,
        models: true,
        search_indexes: true,
        hidden_columns: true,
    };

    /// PostgreSQL-compatible dialect capabilities.
    pub const POSTGRESQL: Self = Self {
        dialect: Dialect::PostgreSql,
        structs: false,
        models: false,
        search_indexes: false,
        hidden_columns: false,
    };
}
