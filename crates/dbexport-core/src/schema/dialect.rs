use super::SqlType;
use crate::{driver::Capability, Result};

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// The SQL dialect of a source database.
///
/// The dialect decides how column type strings are spelled and parsed.
/// Everything downstream of [`Dialect::parse_type`] is dialect agnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Dialect {
    /// GoogleSQL-style standard SQL: `INT64`, `STRING(MAX)`, `ARRAY<T>`,
    /// `STRUCT<name T, ...>`.
    GoogleStandardSql,

    /// PostgreSQL-compatible SQL: `bigint`, `character varying(256)`, `T[]`.
    #[serde(rename = "POSTGRESQL")]
    PostgreSql,
}

impl Dialect {
    /// The capability set describing this dialect.
    pub fn capability(self) -> &'static Capability {
        match self {
            Dialect::GoogleStandardSql => &Capability::GOOGLE_STANDARD_SQL,
            Dialect::PostgreSql => &Capability::POSTGRESQL,
        }
    }

    /// Parses a column type string written in this dialect.
    pub fn parse_type(self, src: &str) -> Result<SqlType> {
        match self {
            Dialect::GoogleStandardSql => super::sql_type::standard::parse(src),
            Dialect::PostgreSql => super::sql_type::postgres::parse(src),
        }
    }

    /// The name recorded in output schemas and the manifest.
    pub fn as_str(self) -> &'static str {
        match self {
            Dialect::GoogleStandardSql => "GOOGLE_STANDARD_SQL",
            Dialect::PostgreSql => "POSTGRESQL",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dialect {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "GOOGLE_STANDARD_SQL" | "GOOGLESQL" | "STANDARD" => Ok(Dialect::GoogleStandardSql),
            "POSTGRESQL" | "POSTGRES" | "PG" => Ok(Dialect::PostgreSql),
            _ => crate::bail!("unknown dialect `{s}`"),
        }
    }
}
