//! Schema synthesis: one self-describing Avro record schema per object.

use crate::{
    name,
    ty::{AvroType, RecordField, TypeMapper},
    SQL_TYPE,
};

use dbexport_core::{
    schema::{Dialect, Field, Object, ObjectKind},
    Result,
};
use serde_json::{json, Map, Value as Json};

/// The synthesized output schema of one object.
///
/// The JSON document is the source of truth: it is embedded verbatim in
/// every file written for the object, and the parsed [`apache_avro::Schema`]
/// is derived from it.
#[derive(Debug)]
pub struct OutputSchema {
    object: String,
    record_name: String,
    document: String,
    avro: apache_avro::Schema,
    columns: Vec<Column>,
}

/// A top-level column of the output record.
#[derive(Debug, Clone)]
pub struct Column {
    /// The catalog definition of the column
    pub field: Field,

    /// Name of the column in the Avro record
    pub avro_name: String,

    pub ty: AvroType,
}

impl Column {
    /// Whether the column has a value to read from the source.
    pub fn is_readable(&self) -> bool {
        self.field.is_readable() && self.ty != AvroType::Null
    }
}

impl OutputSchema {
    /// Builds the output schema of `object`.
    ///
    /// The result only depends on the arguments: synthesizing the same object
    /// twice yields byte-identical documents.
    pub fn synthesize(object: &Object, dialect: Dialect, namespace: &str) -> Result<OutputSchema> {
        let record_name = name::sanitize(&object.name).into_owned();
        let mapper = TypeMapper::new(dialect, &object.name, &record_name);
        let fields = mapper.map_fields(&object.fields, &[])?;

        let mut record = Map::new();
        record.insert("type".into(), "record".into());
        record.insert("name".into(), record_name.clone().into());
        record.insert("namespace".into(), name::sanitize_namespace(namespace).into());
        record.insert(
            "fields".into(),
            Json::Array(fields.iter().map(render_field).collect()),
        );
        if record_name != object.name {
            record.insert("sqlName".into(), object.name.clone().into());
        }
        record.insert("objectKind".into(), object.kind_name().into());
        record.insert("dialect".into(), dialect.as_str().into());

        match &object.kind {
            ObjectKind::Table { primary_key } => {
                for (i, column) in primary_key.iter().enumerate() {
                    record.insert(format!("primaryKey_{i}"), column.clone().into());
                }
            }
            ObjectKind::SearchIndex { table, columns } => {
                record.insert("baseTable".into(), table.clone().into());
                for (i, column) in columns.iter().enumerate() {
                    record.insert(format!("indexColumn_{i}"), column.clone().into());
                }
            }
            ObjectKind::Model => {}
        }

        let document = serde_json::to_string(&Json::Object(record))?;
        let avro = apache_avro::Schema::parse_str(&document)
            .map_err(|err| anyhow::anyhow!("synthesized schema for `{}` is invalid: {err}", object.name))?;

        let columns = object
            .fields
            .iter()
            .zip(fields)
            .map(|(field, mapped)| Column {
                field: field.clone(),
                avro_name: mapped.name,
                ty: mapped.ty,
            })
            .collect();

        Ok(OutputSchema {
            object: object.name.clone(),
            record_name,
            document,
            avro,
            columns,
        })
    }

    /// Name of the object in the source catalog.
    pub fn object(&self) -> &str {
        &self.object
    }

    pub fn record_name(&self) -> &str {
        &self.record_name
    }

    /// The exact JSON schema document.
    pub fn document(&self) -> &str {
        &self.document
    }

    pub fn avro(&self) -> &apache_avro::Schema {
        &self.avro
    }

    /// Top-level columns, in catalog order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// The columns to read from the source, in catalog order.
    pub fn readable_fields(&self) -> Vec<Field> {
        self.columns
            .iter()
            .filter(|column| column.is_readable())
            .map(|column| column.field.clone())
            .collect()
    }
}

fn render_field(field: &RecordField) -> Json {
    let mut out = Map::new();
    out.insert("name".into(), field.name.clone().into());

    let ty = render_type(&field.ty);
    let ty = if field.nullable && field.ty != AvroType::Null {
        json!(["null", ty])
    } else {
        ty
    };
    out.insert("type".into(), ty);
    out.insert(SQL_TYPE.into(), field.sql_type.clone().into());

    if let Some(sql_name) = &field.sql_name {
        out.insert("sqlName".into(), sql_name.clone().into());
    }
    if field.hidden {
        out.insert("hidden".into(), "true".into());
    }
    if let Some(generated) = &field.generated {
        out.insert(
            "generationExpression".into(),
            generated.expression.clone().into(),
        );
        out.insert("stored".into(), generated.stored.to_string().into());
    }
    for (i, option) in field.options.iter().enumerate() {
        out.insert(format!("sqlOption_{i}"), option.clone().into());
    }

    Json::Object(out)
}

fn render_type(ty: &AvroType) -> Json {
    match ty {
        AvroType::Null => "null".into(),
        AvroType::Boolean => "boolean".into(),
        AvroType::Long => "long".into(),
        AvroType::Float => "float".into(),
        AvroType::Double => "double".into(),
        AvroType::String => "string".into(),
        AvroType::Bytes => "bytes".into(),
        AvroType::Decimal { precision, scale } => json!({
            "type": "bytes",
            "logicalType": "decimal",
            "precision": precision,
            "scale": scale,
        }),
        AvroType::Array(elem) => json!({
            "type": "array",
            "items": ["null", render_type(elem)],
        }),
        AvroType::Record(record) => json!({
            "type": "record",
            "name": record.name,
            "fields": record.fields.iter().map(render_field).collect::<Vec<_>>(),
        }),
    }
}
