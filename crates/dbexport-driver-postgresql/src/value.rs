use crate::driver_error;

use dbexport_core::{
    bail,
    stmt::{self, ValueRecord},
    Result,
};
use tokio_postgres::{
    types::{accepts, private::BytesMut, to_sql_checked, FromSql, IsNull, ToSql, Type},
    Row,
};

/// A key value bound as a query parameter.
#[derive(Debug)]
pub struct Value(stmt::Value);

impl From<stmt::Value> for Value {
    fn from(value: stmt::Value) -> Self {
        Self(value)
    }
}

impl ToSql for Value {
    fn to_sql(
        &self,
        ty: &Type,
        out: &mut BytesMut,
    ) -> std::result::Result<IsNull, Box<dyn std::error::Error + Sync + Send>>
    where
        Self: Sized,
    {
        match &self.0 {
            stmt::Value::Bool(value) => value.to_sql(ty, out),
            stmt::Value::I64(value) => match *ty {
                Type::INT2 => i16::try_from(*value)?.to_sql(ty, out),
                Type::INT4 => i32::try_from(*value)?.to_sql(ty, out),
                _ => value.to_sql(ty, out),
            },
            stmt::Value::String(value) => value.to_sql(ty, out),
            stmt::Value::Null => Ok(IsNull::Yes),
            value => Err(format!("cannot bind {} as a {ty} parameter", value.kind_name()).into()),
        }
    }

    accepts!(BOOL, INT2, INT4, INT8, TEXT, VARCHAR, BPCHAR, NAME);
    to_sql_checked!();
}

/// Decodes every column of `row`.
///
/// Columns the shard query casts to text (`numeric`, `date`, timestamps,
/// `json`, `uuid`) arrive as strings.
pub(crate) fn decode_row(row: &Row) -> Result<ValueRecord> {
    let values = (0..row.len())
        .map(|index| decode(row, index))
        .collect::<Result<Vec<_>>>()?;
    Ok(ValueRecord::from_vec(values))
}

pub(crate) fn decode(row: &Row, index: usize) -> Result<stmt::Value> {
    let column = &row.columns()[index];

    let value = match *column.type_() {
        Type::BOOL => scalar::<bool>(row, index)?,
        Type::INT2 => scalar::<i16>(row, index)?,
        Type::INT4 => scalar::<i32>(row, index)?,
        Type::INT8 => scalar::<i64>(row, index)?,
        Type::FLOAT4 => scalar::<f32>(row, index)?,
        Type::FLOAT8 => scalar::<f64>(row, index)?,
        Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME => scalar::<String>(row, index)?,
        Type::BYTEA => scalar::<Vec<u8>>(row, index)?,
        Type::BOOL_ARRAY => list::<bool>(row, index)?,
        Type::INT2_ARRAY => list::<i16>(row, index)?,
        Type::INT4_ARRAY => list::<i32>(row, index)?,
        Type::INT8_ARRAY => list::<i64>(row, index)?,
        Type::FLOAT4_ARRAY => list::<f32>(row, index)?,
        Type::FLOAT8_ARRAY => list::<f64>(row, index)?,
        Type::TEXT_ARRAY | Type::VARCHAR_ARRAY | Type::BPCHAR_ARRAY => list::<String>(row, index)?,
        Type::BYTEA_ARRAY => list::<Vec<u8>>(row, index)?,
        ref ty => bail!(
            "column `{}` has unsupported wire type {ty}",
            column.name()
        ),
    };

    Ok(value.unwrap_or(stmt::Value::Null))
}

fn scalar<'a, T>(row: &'a Row, index: usize) -> Result<Option<stmt::Value>>
where
    T: FromSql<'a> + Into<stmt::Value>,
{
    let value = row.try_get::<_, Option<T>>(index).map_err(driver_error)?;
    Ok(value.map(Into::into))
}

fn list<'a, T>(row: &'a Row, index: usize) -> Result<Option<stmt::Value>>
where
    T: FromSql<'a> + Into<stmt::Value>,
{
    let items = row
        .try_get::<_, Option<Vec<Option<T>>>>(index)
        .map_err(driver_error)?;

    Ok(items.map(|items| {
        stmt::Value::List(items.into_iter().map(stmt::Value::from).collect())
    }))
}
