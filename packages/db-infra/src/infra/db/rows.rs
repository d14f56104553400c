//! JSON in, JSON out: parameter binding and row decoding for raw statements.

use serde_json::{Map, Value};
use sqlx::query::Query;
use sqlx::{Column, ColumnIndex, Database, Decode, Encode, Row, Type};
use time::format_description::well_known::Rfc3339;
use time::{Date, OffsetDateTime, PrimitiveDateTime};

/// Bind JSON parameters positionally. Arrays and objects bind as their JSON text.
pub(crate) fn bind_params<'q, DB>(
    mut query: Query<'q, DB, <DB as Database>::Arguments<'q>>,
    params: &'q [Value],
) -> Query<'q, DB, <DB as Database>::Arguments<'q>>
where
    DB: Database,
    Option<String>: Encode<'q, DB> + Type<DB>,
    bool: Encode<'q, DB> + Type<DB>,
    i64: Encode<'q, DB> + Type<DB>,
    f64: Encode<'q, DB> + Type<DB>,
    &'q str: Encode<'q, DB> + Type<DB>,
    String: Encode<'q, DB> + Type<DB>,
{
    for param in params {
        query = match param {
            Value::Null => query.bind(None::<String>),
            Value::Bool(b) => query.bind(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => query.bind(i),
                None => query.bind(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => query.bind(s.as_str()),
            nested @ (Value::Array(_) | Value::Object(_)) => query.bind(nested.to_string()),
        };
    }
    query
}

/// Decode one row into a JSON object keyed by column name.
///
/// Each column is tried against a fixed list of types; the first compatible
/// decode wins. `extra` gets a chance at columns none of them accept, and
/// anything left over becomes `null`.
pub(crate) fn row_to_json<R, X>(row: &R, extra: X) -> Value
where
    R: Row,
    usize: ColumnIndex<R>,
    X: Fn(&R, usize) -> Option<Value>,
    i64: Type<R::Database> + for<'r> Decode<'r, R::Database>,
    f64: Type<R::Database> + for<'r> Decode<'r, R::Database>,
    bool: Type<R::Database> + for<'r> Decode<'r, R::Database>,
    String: Type<R::Database> + for<'r> Decode<'r, R::Database>,
    OffsetDateTime: Type<R::Database> + for<'r> Decode<'r, R::Database>,
    PrimitiveDateTime: Type<R::Database> + for<'r> Decode<'r, R::Database>,
    Date: Type<R::Database> + for<'r> Decode<'r, R::Database>,
    Vec<u8>: Type<R::Database> + for<'r> Decode<'r, R::Database>,
{
    let mut object = Map::with_capacity(row.columns().len());
    for (idx, column) in row.columns().iter().enumerate() {
        let value = decode_column(row, idx)
            .or_else(|| extra(row, idx))
            .unwrap_or(Value::Null);
        object.insert(column.name().to_string(), value);
    }
    Value::Object(object)
}

fn decode_column<R>(row: &R, idx: usize) -> Option<Value>
where
    R: Row,
    usize: ColumnIndex<R>,
    i64: Type<R::Database> + for<'r> Decode<'r, R::Database>,
    f64: Type<R::Database> + for<'r> Decode<'r, R::Database>,
    bool: Type<R::Database> + for<'r> Decode<'r, R::Database>,
    String: Type<R::Database> + for<'r> Decode<'r, R::Database>,
    OffsetDateTime: Type<R::Database> + for<'r> Decode<'r, R::Database>,
    PrimitiveDateTime: Type<R::Database> + for<'r> Decode<'r, R::Database>,
    Date: Type<R::Database> + for<'r> Decode<'r, R::Database>,
    Vec<u8>: Type<R::Database> + for<'r> Decode<'r, R::Database>,
{
    // A NULL passes every compatibility check, so the first probe settles it.
    if let Ok(v) = row.try_get::<Option<i64>, _>(idx) {
        return Some(v.map(Value::from).unwrap_or(Value::Null));
    }
    if let Ok(v) = row.try_get::<Option<f64>, _>(idx) {
        return Some(v.map(Value::from).unwrap_or(Value::Null));
    }
    if let Ok(v) = row.try_get::<Option<bool>, _>(idx) {
        return Some(v.map(Value::from).unwrap_or(Value::Null));
    }
    if let Ok(v) = row.try_get::<Option<String>, _>(idx) {
        return Some(v.map(Value::from).unwrap_or(Value::Null));
    }
    if let Ok(v) = row.try_get::<Option<OffsetDateTime>, _>(idx) {
        return Some(v.and_then(|t| t.format(&Rfc3339).ok()).map_or(Value::Null, Value::from));
    }
    if let Ok(v) = row.try_get::<Option<PrimitiveDateTime>, _>(idx) {
        return Some(
            v.and_then(|t| t.assume_utc().format(&Rfc3339).ok())
                .map_or(Value::Null, Value::from),
        );
    }
    if let Ok(v) = row.try_get::<Option<Date>, _>(idx) {
        return Some(v.map_or(Value::Null, |d| Value::from(d.to_string())));
    }
    if let Ok(v) = row.try_get::<Option<Vec<u8>>, _>(idx) {
        return Some(v.map_or(Value::Null, |bytes| {
            Value::from(String::from_utf8_lossy(&bytes).into_owned())
        }));
    }
    None
}

/// MySQL reports unsigned integer columns that `i64` refuses to decode.
pub(crate) fn mysql_unsigned(row: &sqlx::mysql::MySqlRow, idx: usize) -> Option<Value> {
    row.try_get::<Option<u64>, _>(idx)
        .ok()
        .map(|v| v.map_or(Value::Null, Value::from))
}

pub(crate) fn no_extra<R>(_row: &R, _idx: usize) -> Option<Value> {
    None
}
