use super::Value;

use std::cmp::Ordering;

impl Value {
    /// Total order over values, used to sort and range-compare primary keys.
    ///
    /// Values of the same variant compare naturally (floats by
    /// `total_cmp`). Integers and floats compare numerically with each other.
    /// Otherwise variants are ranked `Null < Bool < numbers < String < Bytes
    /// < List < Record`.
    pub fn cmp_total(&self, other: &Value) -> Ordering {
        use Value::*;

        match (self, other) {
            (Null, Null) => Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (I64(a), I64(b)) => a.cmp(b),
            (F32(a), F32(b)) => a.total_cmp(b),
            (F64(a), F64(b)) => a.total_cmp(b),
            (I64(a), F64(b)) => (*a as f64).total_cmp(b),
            (F64(a), I64(b)) => a.total_cmp(&(*b as f64)),
            (I64(a), F32(b)) => (*a as f64).total_cmp(&f64::from(*b)),
            (F32(a), I64(b)) => f64::from(*a).total_cmp(&(*b as f64)),
            (F32(a), F64(b)) => f64::from(*a).total_cmp(b),
            (F64(a), F32(b)) => a.total_cmp(&f64::from(*b)),
            (String(a), String(b)) => a.cmp(b),
            (Bytes(a), Bytes(b)) => a.cmp(b),
            (List(a), List(b)) => cmp_slices(a, b),
            (Record(a), Record(b)) => cmp_slices(a, b),
            _ => rank(self).cmp(&rank(other)),
        }
    }
}

pub(super) fn cmp_slices(a: &[Value], b: &[Value]) -> Ordering {
    for (a, b) in a.iter().zip(b) {
        match a.cmp_total(b) {
            Ordering::Equal => continue,
            ord => return ord,
        }
    }
    a.len().cmp(&b.len())
}

fn rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::I64(_) | Value::F32(_) | Value::F64(_) => 2,
        Value::String(_) => 3,
        Value::Bytes(_) => 4,
        Value::List(_) => 5,
        Value::Record(_) => 6,
    }
}
