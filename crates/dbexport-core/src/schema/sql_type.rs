pub(super) mod postgres;
pub(super) mod standard;

/// A parsed source column type.
///
/// Length, precision and vector-length qualifiers are not represented; the
/// verbatim type string on the [`Field`](super::Field) keeps them.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlType {
    Bool,
    Int64,
    Float32,
    Float64,
    Numeric,
    String,
    Bytes,
    Date,
    Timestamp,
    Json,
    Uuid,
    TokenList,
    Array(Box<SqlType>),
    Struct(Vec<StructField>),
}

/// A member of a `STRUCT<...>` type.
#[derive(Debug, Clone, PartialEq)]
pub struct StructField {
    pub name: String,

    /// The member's type, verbatim as written inside the enclosing struct.
    pub sql_type: String,

    pub ty: SqlType,
}

impl SqlType {
    pub fn is_struct(&self) -> bool {
        matches!(self, SqlType::Struct(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, SqlType::Array(_))
    }
}
