//! Statement text for shard reads.

use crate::Value;

use dbexport_core::{
    schema::{Dialect, Field, SqlType},
    stmt::{Key, KeyRange},
};
use std::{fmt::Write, ops::Bound};

pub(crate) fn ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

pub(crate) fn table(schema: &str, table: &str) -> String {
    format!("{}.{}", ident(schema), ident(table))
}

/// The select-list expression for `field`.
///
/// Types without a binary decoding are read as their text form, which is
/// what the output encoder expects for them.
pub(crate) fn column(field: &Field) -> String {
    let name = ident(&field.name);

    match Dialect::PostgreSql.parse_type(&field.sql_type) {
        Ok(SqlType::Array(item)) if is_text_read(&item) => format!("{name}::text[]"),
        Ok(ty) if is_text_read(&ty) => format!("{name}::text"),
        _ => name,
    }
}

fn is_text_read(ty: &SqlType) -> bool {
    matches!(
        ty,
        SqlType::Numeric | SqlType::Date | SqlType::Timestamp | SqlType::Json | SqlType::Uuid
    )
}

/// A key column as it appears in comparisons and `ORDER BY`.
///
/// Text keys compare byte-wise (`COLLATE "C"`), the order split points are
/// sorted in before they become shard bounds.
pub(crate) fn key_column(field: &Field) -> String {
    let name = ident(&field.name);

    match Dialect::PostgreSql.parse_type(&field.sql_type) {
        Ok(SqlType::String) => format!("{name} COLLATE \"C\""),
        _ => name,
    }
}

/// Only single-column integer and text keys are split.
pub(crate) fn is_splittable(key: &[Field]) -> bool {
    match key {
        [field] => matches!(
            Dialect::PostgreSql.parse_type(&field.sql_type),
            Ok(SqlType::Int64 | SqlType::String)
        ),
        _ => false,
    }
}

/// Returns the first key of each of `count` equally sized buckets.
pub(crate) fn split_points(schema: &str, name: &str, key: &Field) -> String {
    let key = key_column(key);
    format!(
        "SELECT min(k) FROM (\
            SELECT {key} AS k, ntile($1) OVER (ORDER BY {key}) AS bucket FROM {}\
         ) AS buckets GROUP BY bucket ORDER BY bucket",
        table(schema, name)
    )
}

/// A `SELECT` over the rows of `name` within `range`, in key order, and the
/// parameters it binds.
pub(crate) fn read_shard(
    schema: &str,
    name: &str,
    columns: &[Field],
    key: &[Field],
    range: &KeyRange,
) -> (String, Vec<Value>) {
    let mut sql = String::from("SELECT ");
    for (i, field) in columns.iter().enumerate() {
        if i > 0 {
            sql.push_str(", ");
        }
        sql.push_str(&column(field));
    }
    write!(sql, " FROM {}", table(schema, name)).unwrap();

    let key_columns: Vec<_> = key.iter().map(key_column).collect();
    let key_expr = match &key_columns[..] {
        [column] => column.clone(),
        columns => format!("({})", columns.join(", ")),
    };

    let mut params = vec![];
    let mut conditions = vec![];

    for (bound, inclusive, exclusive) in [(&range.start, ">=", ">"), (&range.end, "<=", "<")] {
        let (op, key) = match bound {
            Bound::Unbounded => continue,
            Bound::Included(key) => (inclusive, key),
            Bound::Excluded(key) => (exclusive, key),
        };
        let placeholders = placeholders(&mut params, key);
        conditions.push(format!("{key_expr} {op} {placeholders}"));
    }

    if !conditions.is_empty() {
        write!(sql, " WHERE {}", conditions.join(" AND ")).unwrap();
    }

    if !key_columns.is_empty() {
        write!(sql, " ORDER BY {}", key_columns.join(", ")).unwrap();
    }

    (sql, params)
}

fn placeholders(params: &mut Vec<Value>, key: &Key) -> String {
    let mut out = vec![];
    for value in &key.values {
        params.push(Value::from(value.clone()));
        out.push(format!("${}", params.len()));
    }

    if out.len() == 1 {
        out.remove(0)
    } else {
        format!("({})", out.join(", "))
    }
}
