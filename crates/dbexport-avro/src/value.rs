use crate::{
    schema::OutputSchema,
    ty::{AvroType, RecordField},
};

use apache_avro::{types::Value as Avro, Decimal};
use dbexport_core::{
    stmt::{Value, ValueRecord},
    Result,
};

/// Encodes one source row as an Avro record of `schema`.
///
/// `row` holds the values of the schema's readable columns, in column order.
/// Columns without a readable value are written as `null`.
pub fn encode_record(schema: &OutputSchema, row: ValueRecord) -> Result<Avro> {
    let readable = schema
        .columns()
        .iter()
        .filter(|column| column.is_readable())
        .count();

    if row.len() != readable {
        dbexport_core::bail!(
            "row of `{}` has {} values, expected {}",
            schema.object(),
            row.len(),
            readable
        );
    }

    let mut values = row.into_iter();
    let mut fields = Vec::with_capacity(schema.columns().len());

    for column in schema.columns() {
        let value = if column.is_readable() {
            // lengths were checked above
            let value = values.next().unwrap_or_default();
            encode_nullable(&column.field.name, &column.ty, column.field.nullable, value)?
        } else {
            Avro::Null
        };
        fields.push((column.avro_name.clone(), value));
    }

    Ok(Avro::Record(fields))
}

fn encode_nullable(column: &str, ty: &AvroType, nullable: bool, value: Value) -> Result<Avro> {
    match (nullable, value) {
        (true, Value::Null) => Ok(Avro::Union(0, Box::new(Avro::Null))),
        (true, value) => Ok(Avro::Union(1, Box::new(encode(column, ty, value)?))),
        (false, Value::Null) => {
            dbexport_core::bail!("column `{column}` is not nullable but the value is null")
        }
        (false, value) => encode(column, ty, value),
    }
}

fn encode(column: &str, ty: &AvroType, value: Value) -> Result<Avro> {
    Ok(match (ty, value) {
        (AvroType::Null, _) => Avro::Null,
        (AvroType::Boolean, Value::Bool(v)) => Avro::Boolean(v),
        (AvroType::Long, Value::I64(v)) => Avro::Long(v),
        (AvroType::Float, Value::F32(v)) => Avro::Float(v),
        (AvroType::Float, Value::F64(v)) => Avro::Float(v as f32),
        (AvroType::Double, Value::F64(v)) => Avro::Double(v),
        (AvroType::Double, Value::F32(v)) => Avro::Double(v.into()),
        (AvroType::String, Value::String(v)) => Avro::String(v),
        (AvroType::Bytes, Value::Bytes(v)) => Avro::Bytes(v),
        (AvroType::Decimal { precision, scale }, Value::String(v)) => {
            Avro::Decimal(Decimal::from(decimal_bytes(column, &v, *precision, *scale)?))
        }
        (AvroType::Decimal { precision, scale }, Value::I64(v)) => Avro::Decimal(Decimal::from(
            decimal_bytes(column, &v.to_string(), *precision, *scale)?,
        )),
        (AvroType::Array(elem), Value::List(items)) => Avro::Array(
            items
                .into_iter()
                .map(|item| encode_nullable(column, elem, true, item))
                .collect::<Result<_>>()?,
        ),
        (AvroType::Record(record), Value::Record(row)) => {
            encode_struct(column, &record.fields, row)?
        }
        (ty, value) => dbexport_core::bail!(
            "column `{column}`: cannot encode {} as {}",
            value.kind_name(),
            ty.name()
        ),
    })
}

fn encode_struct(column: &str, fields: &[RecordField], row: ValueRecord) -> Result<Avro> {
    if row.len() != fields.len() {
        dbexport_core::bail!(
            "column `{column}`: struct has {} members, expected {}",
            row.len(),
            fields.len()
        );
    }

    let members = fields
        .iter()
        .zip(row)
        .map(|(field, value)| {
            let path = format!("{column}.{}", field.name);
            Ok((
                field.name.clone(),
                encode_nullable(&path, &field.ty, field.nullable, value)?,
            ))
        })
        .collect::<Result<_>>()?;

    Ok(Avro::Record(members))
}

/// Parses a decimal literal into the unscaled two's-complement big-endian
/// bytes of the Avro `decimal` logical type.
fn decimal_bytes(column: &str, text: &str, precision: u32, scale: u32) -> Result<Vec<u8>> {
    let invalid = || dbexport_core::err!("column `{column}`: invalid NUMERIC value `{text}`");

    let (negative, digits) = match text.trim().strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.trim().trim_start_matches('+')),
    };
    let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits, ""));

    if (int_part.is_empty() && frac_part.is_empty())
        || !int_part.bytes().all(|b| b.is_ascii_digit())
        || !frac_part.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(invalid());
    }

    let frac_part = frac_part.trim_end_matches('0');
    if frac_part.len() > scale as usize {
        return Err(invalid());
    }

    let mut unscaled: i128 = 0;
    for b in int_part
        .bytes()
        .chain(frac_part.bytes())
        .chain(std::iter::repeat(b'0').take(scale as usize - frac_part.len()))
    {
        unscaled = unscaled
            .checked_mul(10)
            .and_then(|v| v.checked_add(i128::from(b - b'0')))
            .ok_or_else(invalid)?;
    }

    if unscaled >= 10_i128.pow(precision.min(38)) {
        return Err(invalid());
    }
    if negative {
        unscaled = -unscaled;
    }

    Ok(twos_complement(unscaled))
}

fn twos_complement(value: i128) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let mut start = 0;

    while start < bytes.len() - 1 {
        let redundant = match bytes[start] {
            0x00 => bytes[start + 1] & 0x80 == 0,
            0xff => bytes[start + 1] & 0x80 != 0,
            _ => false,
        };
        if !redundant {
            break;
        }
        start += 1;
    }

    bytes[start..].to_vec()
}
