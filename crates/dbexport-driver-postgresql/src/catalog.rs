use crate::driver_error;

use dbexport_core::{
    schema::{Field, Object},
    Result,
};
use indexmap::IndexMap;
use tokio_postgres::Client;

const COLUMNS: &str = "\
SELECT c.relname, a.attname, format_type(a.atttypid, a.atttypmod), a.attnotnull,
       a.attgenerated::text, pg_get_expr(d.adbin, d.adrelid)
FROM pg_class c
JOIN pg_namespace n ON n.oid = c.relnamespace
JOIN pg_attribute a ON a.attrelid = c.oid AND a.attnum > 0 AND NOT a.attisdropped
LEFT JOIN pg_attrdef d ON d.adrelid = c.oid AND d.adnum = a.attnum
WHERE n.nspname = $1
  AND c.relkind IN ('r', 'p')
  AND NOT c.relispartition
  AND ($2::text IS NULL OR c.relname = $2)
ORDER BY c.relname, a.attnum";

const PRIMARY_KEYS: &str = "\
SELECT c.relname, a.attname
FROM pg_index i
JOIN pg_class c ON c.oid = i.indrelid
JOIN pg_namespace n ON n.oid = c.relnamespace
CROSS JOIN LATERAL unnest(i.indkey::int2[]) WITH ORDINALITY AS k(attnum, ord)
JOIN pg_attribute a ON a.attrelid = c.oid AND a.attnum = k.attnum
WHERE n.nspname = $1
  AND i.indisprimary
  AND ($2::text IS NULL OR c.relname = $2)
ORDER BY c.relname, k.ord";

const ESTIMATE: &str = "\
SELECT c.reltuples::bigint
FROM pg_class c
JOIN pg_namespace n ON n.oid = c.relnamespace
WHERE n.nspname = $1 AND c.relname = $2";

/// Loads the tables of `schema`, or only `name` when given, in name order.
///
/// Runs on whatever transaction is open on `client`.
pub(crate) async fn load(client: &Client, schema: &str, name: Option<&str>) -> Result<Vec<Object>> {
    let mut tables = IndexMap::<String, Vec<Field>>::new();

    for row in client
        .query(COLUMNS, &[&schema, &name])
        .await
        .map_err(driver_error)?
    {
        let table: String = row.try_get(0).map_err(driver_error)?;
        let column: String = row.try_get(1).map_err(driver_error)?;
        let sql_type: String = row.try_get(2).map_err(driver_error)?;
        let not_null: bool = row.try_get(3).map_err(driver_error)?;
        let generated: String = row.try_get(4).map_err(driver_error)?;
        let expression: Option<String> = row.try_get(5).map_err(driver_error)?;

        let mut field = Field::new(column, sql_type);
        if not_null {
            field = field.not_null();
        }
        // `s`: stored, `v`: virtual, empty for ordinary columns whose
        // pg_attrdef entry is a default
        if !generated.is_empty() {
            field = field.generated(expression.unwrap_or_default(), generated == "s");
        }

        tables.entry(table).or_default().push(field);
    }

    let mut keys = IndexMap::<String, Vec<String>>::new();

    for row in client
        .query(PRIMARY_KEYS, &[&schema, &name])
        .await
        .map_err(driver_error)?
    {
        let table: String = row.try_get(0).map_err(driver_error)?;
        let column: String = row.try_get(1).map_err(driver_error)?;
        keys.entry(table).or_default().push(column);
    }

    Ok(tables
        .into_iter()
        .map(|(table, fields)| {
            let primary_key = keys.swap_remove(&table).unwrap_or_default();
            Object::table(table, fields, primary_key)
        })
        .collect())
}

/// The planner's row estimate, or `None` when the table was never analyzed.
pub(crate) async fn estimate(client: &Client, schema: &str, table: &str) -> Result<Option<u64>> {
    let row = client
        .query_opt(ESTIMATE, &[&schema, &table])
        .await
        .map_err(driver_error)?;

    let Some(row) = row else {
        return Ok(None);
    };

    let estimate: i64 = row.try_get(0).map_err(driver_error)?;
    Ok(u64::try_from(estimate).ok().filter(|n| *n > 0))
}
