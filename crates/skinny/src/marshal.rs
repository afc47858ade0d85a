//! Row to record marshaling.
//!
//! A raw row is a positional list of [`Value`]s in schema declaration order.
//! With coercion enabled each cell is converted to its declared [`FieldType`]
//! before the record is built; with coercion disabled the row is handed to
//! [`Entity::from_values`] untouched.

use crate::error::{OrmError, OrmResult};
use crate::schema::{Entity, FieldDef, FieldType, Schema, expect_arity};
use crate::value::Value;
use chrono::{DateTime, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime};

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S%.f",
    "%d/%m/%Y %H:%M:%S",
    "%d.%m.%Y %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%d.%m.%Y"];

/// Best-effort timestamp parser for store-native text.
///
/// Accepts RFC 3339 (converted to UTC), common `Y-m-d` / `d/m/Y` layouts with
/// or without a time part, and the words `now`, `today`, `yesterday` and
/// `tomorrow` (local time). Returns `None` when nothing matches.
pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    match text.to_ascii_lowercase().as_str() {
        "now" => return Some(Local::now().naive_local()),
        "today" => return Some(Local::now().date_naive().and_time(NaiveTime::MIN)),
        "yesterday" => {
            return Some((Local::now() - Duration::days(1)).date_naive().and_time(NaiveTime::MIN));
        }
        "tomorrow" => {
            return Some((Local::now() + Duration::days(1)).date_naive().and_time(NaiveTime::MIN));
        }
        _ => {}
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Some(ts.naive_utc());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(ts);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, fmt) {
            return Some(date.and_time(NaiveTime::MIN));
        }
    }
    None
}

/// Convert one cell to its declared type.
pub fn coerce(field: &FieldDef, value: Value) -> OrmResult<Value> {
    let fail = || OrmError::parse(field.name, field.ty);
    match (field.ty, value) {
        (FieldType::Integer, Value::Integer(v)) => Ok(Value::Integer(v)),
        (FieldType::Integer, Value::Real(v)) if v.is_finite() => Ok(Value::Integer(v.trunc() as i64)),
        (FieldType::Integer, Value::Text(s)) => {
            s.trim().parse::<i64>().map(Value::Integer).map_err(|_| fail())
        }

        (FieldType::Real, Value::Real(v)) => Ok(Value::Real(v)),
        (FieldType::Real, Value::Integer(v)) => Ok(Value::Real(v as f64)),
        (FieldType::Real, Value::Text(s)) => s.trim().parse::<f64>().map(Value::Real).map_err(|_| fail()),

        (FieldType::Text, Value::Text(s)) => Ok(Value::Text(s)),
        (FieldType::Text, Value::Blob(bytes)) => {
            String::from_utf8(bytes).map(Value::Text).map_err(|_| fail())
        }
        (FieldType::Text, v @ (Value::Integer(_) | Value::Real(_) | Value::Timestamp(_))) => {
            Ok(Value::Text(v.to_string()))
        }

        (FieldType::Timestamp, Value::Timestamp(ts)) => Ok(Value::Timestamp(ts)),
        (FieldType::Timestamp, Value::Text(s)) => {
            parse_timestamp(&s).map(Value::Timestamp).ok_or_else(fail)
        }

        _ => Err(fail()),
    }
}

/// Turns raw rows into records of the bound entity.
#[derive(Debug, Clone, Copy)]
pub struct Marshaler {
    parse_fields: bool,
}

impl Default for Marshaler {
    fn default() -> Self {
        Self { parse_fields: true }
    }
}

impl Marshaler {
    pub fn new(parse_fields: bool) -> Self {
        Self { parse_fields }
    }

    pub fn parse_fields(&self) -> bool {
        self.parse_fields
    }

    /// Coerce every cell of `row` positionally against `schema`.
    ///
    /// Returns the row unchanged when coercion is disabled.
    pub fn coerce_row(&self, schema: &Schema, row: Vec<Value>) -> OrmResult<Vec<Value>> {
        if !self.parse_fields {
            return Ok(row);
        }
        expect_arity(schema, &row)?;
        schema
            .fields
            .iter()
            .zip(row)
            .map(|(field, value)| coerce(field, value))
            .collect()
    }

    pub fn record<E: Entity>(&self, row: Vec<Value>) -> OrmResult<E> {
        let values = self.coerce_row(E::schema(), row)?;
        E::from_values(values)
    }

    pub fn records<E: Entity>(&self, rows: Vec<Vec<Value>>) -> OrmResult<Vec<E>> {
        rows.into_iter().map(|row| self.record(row)).collect()
    }
}
