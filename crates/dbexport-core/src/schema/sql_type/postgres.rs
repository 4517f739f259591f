//! Type grammar for the PostgreSQL-compatible dialect.
//!
//! Type strings are spelled the way `format_type()` renders them:
//! `bigint`, `character varying(256)`, `timestamp(6) with time zone`,
//! `numeric(10,2)`, `text[]`. Modifiers in parentheses are accepted and
//! discarded; a trailing `[]` makes an array of the base type.

use super::SqlType;
use crate::{bail, Result};

pub(crate) fn parse(src: &str) -> Result<SqlType> {
    let mut base = src.trim();

    let mut dims = 0;
    while let Some(rest) = base.strip_suffix("[]") {
        base = rest.trim_end();
        dims += 1;
    }

    if dims > 1 {
        bail!("multi-dimensional array type `{src}` is not supported");
    }

    let ty = scalar(&normalize(base)?).ok_or_else(|| crate::err!("unknown type `{src}`"))?;

    Ok(if dims == 1 {
        SqlType::Array(Box::new(ty))
    } else {
        ty
    })
}

fn scalar(name: &str) -> Option<SqlType> {
    let ty = match name {
        "bigint" | "int8" | "integer" | "int" | "int4" | "smallint" | "int2" => SqlType::Int64,
        "real" | "float4" => SqlType::Float32,
        "double precision" | "float8" | "float" => SqlType::Float64,
        "boolean" | "bool" => SqlType::Bool,
        "character varying" | "varchar" | "character" | "char" | "text" | "bpchar" => {
            SqlType::String
        }
        "bytea" => SqlType::Bytes,
        "date" => SqlType::Date,
        "timestamp with time zone"
        | "timestamptz"
        | "timestamp without time zone"
        | "timestamp"
        | "spanner.commit_timestamp" => SqlType::Timestamp,
        "numeric" | "decimal" => SqlType::Numeric,
        "jsonb" | "json" => SqlType::Json,
        "uuid" => SqlType::Uuid,
        "tokenlist" | "spanner.tokenlist" => SqlType::TokenList,
        _ => return None,
    };
    Some(ty)
}

/// Lowercases, drops `(...)` modifiers and collapses whitespace.
fn normalize(src: &str) -> Result<String> {
    let mut out = String::with_capacity(src.len());
    let mut depth = 0usize;

    for c in src.chars() {
        match c {
            '(' => depth += 1,
            ')' => {
                if depth == 0 {
                    bail!("unbalanced `)` in type `{src}`");
                }
                depth -= 1;
            }
            _ if depth > 0 => {}
            _ => out.push(c.to_ascii_lowercase()),
        }
    }

    if depth != 0 {
        bail!("unbalanced `(` in type `{src}`");
    }

    Ok(out.split_whitespace().collect::<Vec<_>>().join(" "))
}
