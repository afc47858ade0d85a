//! Opaque column values.
//!
//! [`Value`] is what flows between the mapper and a store connector: comparator
//! operands, insert/update parameters, and raw row cells all use it.

use crate::error::{OrmError, OrmResult};
use chrono::{DateTime, NaiveDateTime, Utc};
use std::fmt;

/// Text layout used when a timestamp is handed to the store.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// A single column value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
    /// Timestamp without zone; stores persist it as text.
    Timestamp(NaiveDateTime),
}

impl Value {
    /// Short name of the variant, used in decode messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Integer(_) => "integer",
            Value::Real(_) => "real",
            Value::Text(_) => "text",
            Value::Blob(_) => "blob",
            Value::Timestamp(_) => "timestamp",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Render a timestamp the way it is persisted.
    pub fn timestamp_text(ts: &NaiveDateTime) -> String {
        ts.format(TIMESTAMP_FORMAT).to_string()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Integer(v) => write!(f, "{v}"),
            Value::Real(v) => write!(f, "{v}"),
            Value::Text(v) => f.write_str(v),
            Value::Blob(v) => write!(f, "<{} bytes>", v.len()),
            Value::Timestamp(v) => f.write_str(&Value::timestamp_text(v)),
        }
    }
}

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::Integer(i64::from(v))
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32, bool);

impl From<isize> for Value {
    fn from(v: isize) -> Self {
        Value::Integer(v as i64)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Real(f64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<&String> for Value {
    fn from(v: &String) -> Self {
        Value::Text(v.clone())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Blob(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::Timestamp(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Timestamp(v.naive_utc())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// Strict conversion from a [`Value`] into a Rust field type.
///
/// No coercion happens here: the value must already have the right shape
/// (integers may widen to floats). Coercion is the marshaler's job.
pub trait FromValue: Sized {
    fn from_value(value: Value, column: &str) -> OrmResult<Self>;
}

fn mismatch(column: &str, expected: &str, got: &Value) -> OrmError {
    OrmError::decode(column, format!("expected {expected}, got {}", got.kind()))
}

impl FromValue for Value {
    fn from_value(value: Value, _column: &str) -> OrmResult<Self> {
        Ok(value)
    }
}

impl FromValue for i64 {
    fn from_value(value: Value, column: &str) -> OrmResult<Self> {
        match value {
            Value::Integer(v) => Ok(v),
            other => Err(mismatch(column, "integer", &other)),
        }
    }
}

macro_rules! impl_from_value_narrow_int {
    ($($t:ty),*) => {
        $(
            impl FromValue for $t {
                fn from_value(value: Value, column: &str) -> OrmResult<Self> {
                    let wide = i64::from_value(value, column)?;
                    <$t>::try_from(wide).map_err(|_| {
                        OrmError::decode(column, format!("{wide} out of range for {}", stringify!($t)))
                    })
                }
            }
        )*
    };
}

impl_from_value_narrow_int!(i8, i16, i32, u8, u16, u32, isize);

impl FromValue for bool {
    fn from_value(value: Value, column: &str) -> OrmResult<Self> {
        Ok(i64::from_value(value, column)? != 0)
    }
}

impl FromValue for f64 {
    fn from_value(value: Value, column: &str) -> OrmResult<Self> {
        match value {
            Value::Real(v) => Ok(v),
            Value::Integer(v) => Ok(v as f64),
            other => Err(mismatch(column, "real", &other)),
        }
    }
}

impl FromValue for f32 {
    fn from_value(value: Value, column: &str) -> OrmResult<Self> {
        Ok(f64::from_value(value, column)? as f32)
    }
}

impl FromValue for String {
    fn from_value(value: Value, column: &str) -> OrmResult<Self> {
        match value {
            Value::Text(v) => Ok(v),
            other => Err(mismatch(column, "text", &other)),
        }
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: Value, column: &str) -> OrmResult<Self> {
        match value {
            Value::Blob(v) => Ok(v),
            other => Err(mismatch(column, "blob", &other)),
        }
    }
}

impl FromValue for NaiveDateTime {
    fn from_value(value: Value, column: &str) -> OrmResult<Self> {
        match value {
            Value::Timestamp(v) => Ok(v),
            other => Err(mismatch(column, "timestamp", &other)),
        }
    }
}

impl FromValue for DateTime<Utc> {
    fn from_value(value: Value, column: &str) -> OrmResult<Self> {
        Ok(NaiveDateTime::from_value(value, column)?.and_utc())
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value, column: &str) -> OrmResult<Self> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other, column).map(Some),
        }
    }
}
