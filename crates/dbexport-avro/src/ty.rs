//! The dialect type mapper: source column types to Avro types.
//!
//! | source (standard / postgres)                  | Avro                              |
//! |-----------------------------------------------|-----------------------------------|
//! | `BOOL` / `boolean`                            | `boolean`                         |
//! | `INT64` / `bigint`, `integer`, `smallint`     | `long`                            |
//! | `FLOAT32` / `real`                            | `float`                           |
//! | `FLOAT64` / `double precision`                | `double`                          |
//! | `STRING(n)` / `character varying(n)`, `text`  | `string`                          |
//! | `BYTES(n)` / `bytea`, `TOKENLIST`             | `bytes`                           |
//! | `DATE`, `TIMESTAMP`, `JSON`, `uuid`           | `string`                          |
//! | `NUMERIC`                                     | `bytes` decimal(38, 9)            |
//! | `numeric`                                     | `string`                          |
//! | `ARRAY<T>` / `T[]`                            | `array` of `["null", T]`          |
//! | `STRUCT<...>`                                 | named `record`                    |
//!
//! Length qualifiers never reach the Avro type; the verbatim source string
//! travels alongside as the field's `sqlType` annotation.

use crate::name;

use dbexport_core::{
    schema::{Dialect, Field, Generated, SqlType},
    Error, Result,
};
use std::collections::HashSet;

/// Precision of the standard dialect's `NUMERIC`.
pub const NUMERIC_PRECISION: u32 = 38;

/// Scale of the standard dialect's `NUMERIC`.
pub const NUMERIC_SCALE: u32 = 9;

#[derive(Debug, Clone, PartialEq)]
pub enum AvroType {
    /// Schema-only column with no readable value
    Null,
    Boolean,
    Long,
    Float,
    Double,
    String,
    Bytes,

    /// `bytes` with the `decimal` logical type
    Decimal {
        precision: u32,
        scale: u32,
    },

    /// Elements are always a union with `null`
    Array(Box<AvroType>),

    Record(RecordType),
}

/// A named Avro record.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordType {
    pub name: String,
    pub fields: Vec<RecordField>,
}

/// A field of a [`RecordType`], with everything needed to render its
/// annotations.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordField {
    /// Valid Avro field name
    pub name: String,

    /// Name in the source database, when it differs from `name`
    pub sql_name: Option<String>,

    /// Source type string, verbatim
    pub sql_type: String,

    pub ty: AvroType,

    /// Rendered as `["null", ty]`
    pub nullable: bool,

    pub hidden: bool,

    pub generated: Option<Generated>,

    pub options: Vec<String>,
}

impl AvroType {
    /// The Avro type name, for messages.
    pub fn name(&self) -> &str {
        match self {
            AvroType::Null => "null",
            AvroType::Boolean => "boolean",
            AvroType::Long => "long",
            AvroType::Float => "float",
            AvroType::Double => "double",
            AvroType::String => "string",
            AvroType::Bytes => "bytes",
            AvroType::Decimal { .. } => "decimal",
            AvroType::Array(_) => "array",
            AvroType::Record(record) => &record.name,
        }
    }
}

/// Maps the fields of one object.
///
/// Nested record names are derived from where the record sits in the
/// object. A `STRUCT` column is named `<prefix>_struct_<i>_<j>...` where
/// each index is the member's position in its parent. A nested group is
/// named after its enclosing records: `<prefix>_<group>_<subgroup>...`.
/// Both are unique per object, without any shared name registry.
#[derive(Debug)]
pub struct TypeMapper<'a> {
    dialect: Dialect,
    object: &'a str,
    prefix: &'a str,
}

impl<'a> TypeMapper<'a> {
    pub fn new(dialect: Dialect, object: &'a str, prefix: &'a str) -> Self {
        Self {
            dialect,
            object,
            prefix,
        }
    }

    /// Maps the fields of one record, naming members uniquely.
    pub fn map_fields(&self, fields: &[Field], path: &[usize]) -> Result<Vec<RecordField>> {
        self.map_record_fields(self.prefix, fields, path)
    }

    /// Maps the fields of the record named `scope`.
    fn map_record_fields(
        &self,
        scope: &str,
        fields: &[Field],
        path: &[usize],
    ) -> Result<Vec<RecordField>> {
        let mut used = HashSet::new();
        let mut ret = Vec::with_capacity(fields.len());

        for (i, field) in fields.iter().enumerate() {
            let mut path = path.to_vec();
            path.push(i);

            let (avro_name, sql_name) = unique_name(&mut used, &field.name, i);
            let record = format!("{scope}_{avro_name}");
            let ty = self.map_field_type(field, &record, &path)?;

            ret.push(RecordField {
                name: avro_name,
                sql_name,
                sql_type: field.sql_type.clone(),
                ty,
                nullable: field.nullable,
                hidden: field.hidden,
                generated: field.generated.clone(),
                options: field.options.clone(),
            });
        }

        Ok(ret)
    }

    /// `record` names the field's type if it is a nested group.
    fn map_field_type(&self, field: &Field, record: &str, path: &[usize]) -> Result<AvroType> {
        if !field.is_readable() {
            // The type is still validated so an unknown type is reported even
            // when no value will ever be written.
            self.parse(field)?;
            return Ok(AvroType::Null);
        }

        if let Some(nested) = &field.nested {
            return Ok(AvroType::Record(RecordType {
                name: record.to_string(),
                fields: self.map_record_fields(record, &nested.fields, path)?,
            }));
        }

        let ty = self.parse(field)?;
        self.map_parsed(&field.name, &field.sql_type, &ty, path)
    }

    fn parse(&self, field: &Field) -> Result<SqlType> {
        self.dialect.parse_type(&field.sql_type).map_err(|err| {
            err.context(Error::unsupported_type(
                self.object,
                &field.name,
                &field.sql_type,
            ))
        })
    }

    fn map_parsed(
        &self,
        field: &str,
        sql_type: &str,
        ty: &SqlType,
        path: &[usize],
    ) -> Result<AvroType> {
        Ok(match ty {
            SqlType::Bool => AvroType::Boolean,
            SqlType::Int64 => AvroType::Long,
            SqlType::Float32 => AvroType::Float,
            SqlType::Float64 => AvroType::Double,
            SqlType::String | SqlType::Date | SqlType::Timestamp | SqlType::Json | SqlType::Uuid => {
                AvroType::String
            }
            SqlType::Bytes | SqlType::TokenList => AvroType::Bytes,
            SqlType::Numeric => match self.dialect {
                Dialect::GoogleStandardSql => AvroType::Decimal {
                    precision: NUMERIC_PRECISION,
                    scale: NUMERIC_SCALE,
                },
                Dialect::PostgreSql => AvroType::String,
            },
            SqlType::Array(elem) => {
                AvroType::Array(Box::new(self.map_parsed(field, sql_type, elem, path)?))
            }
            SqlType::Struct(members) => {
                if !self.dialect.capability().structs {
                    return Err(Error::unsupported_type(self.object, field, sql_type));
                }

                let mut used = HashSet::new();
                let mut fields = Vec::with_capacity(members.len());

                for (i, member) in members.iter().enumerate() {
                    let mut path = path.to_vec();
                    path.push(i);

                    let (avro_name, sql_name) = unique_name(&mut used, &member.name, i);
                    let member_field = format!("{field}.{}", member.name);

                    fields.push(RecordField {
                        name: avro_name,
                        sql_name,
                        sql_type: member.sql_type.clone(),
                        ty: self.map_parsed(&member_field, &member.sql_type, &member.ty, &path)?,
                        nullable: true,
                        hidden: false,
                        generated: None,
                        options: vec![],
                    });
                }

                AvroType::Record(RecordType {
                    name: record_name(self.prefix, path),
                    fields,
                })
            }
        })
    }
}

/// Maps a single source type string outside of any object, naming nested
/// records after `prefix`.
pub fn map_type(dialect: Dialect, prefix: &str, sql_type: &str) -> Result<AvroType> {
    let mapper = TypeMapper::new(dialect, prefix, prefix);
    let field = Field::new(prefix, sql_type);
    mapper.map_field_type(&field, prefix, &[0])
}

fn record_name(prefix: &str, path: &[usize]) -> String {
    let path = path
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join("_");
    format!("{prefix}_struct_{path}")
}

fn unique_name(used: &mut HashSet<String>, name: &str, index: usize) -> (String, Option<String>) {
    let mut avro_name = name::sanitize(name).into_owned();

    if used.contains(&avro_name) {
        avro_name = format!("{avro_name}_{index}");
    }
    used.insert(avro_name.clone());

    let sql_name = (avro_name != name).then(|| name.to_string());
    (avro_name, sql_name)
}
