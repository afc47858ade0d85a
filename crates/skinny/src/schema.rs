//! Schema descriptors and the [`Entity`] trait.
//!
//! A [`Schema`] is the ordered `field name -> declared type` mapping for one
//! entity kind. It is static and read-only; the mapper never mutates it and
//! never installs anything on the entity type.

use crate::error::{OrmError, OrmResult};
use crate::expr::Field;
use crate::ident::check_ident;
use crate::value::Value;
use chrono::{DateTime, NaiveDateTime, Utc};
use std::fmt;

/// Declared semantic type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    Integer,
    Text,
    Real,
    Timestamp,
}

impl FieldType {
    /// Column type used when the table is created.
    pub const fn sql_type(self) -> &'static str {
        match self {
            FieldType::Integer => "INTEGER",
            FieldType::Text => "TEXT",
            FieldType::Real => "REAL",
            FieldType::Timestamp => "TEXT",
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            FieldType::Integer => "integer",
            FieldType::Text => "text",
            FieldType::Real => "real",
            FieldType::Timestamp => "timestamp",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Maps Rust field types to the [`FieldType`] they are declared as.
///
/// Used by `#[derive(Entity)]` to build the schema descriptor.
pub trait HasFieldType {
    const FIELD_TYPE: FieldType;
}

macro_rules! impl_has_field_type {
    ($ft:ident => $($t:ty),*) => {
        $(
            impl HasFieldType for $t {
                const FIELD_TYPE: FieldType = FieldType::$ft;
            }
        )*
    };
}

impl_has_field_type!(Integer => i8, i16, i32, i64, isize, u8, u16, u32, bool);
impl_has_field_type!(Real => f32, f64);
impl_has_field_type!(Text => String, &str);
impl_has_field_type!(Timestamp => NaiveDateTime, DateTime<Utc>);

impl<T: HasFieldType> HasFieldType for Option<T> {
    const FIELD_TYPE: FieldType = T::FIELD_TYPE;
}

/// One declared field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    pub name: &'static str,
    pub ty: FieldType,
}

impl FieldDef {
    pub const fn new(name: &'static str, ty: FieldType) -> Self {
        Self { name, ty }
    }
}

/// Ordered field list for one entity kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schema {
    pub entity: &'static str,
    pub fields: &'static [FieldDef],
}

impl Schema {
    pub const fn new(entity: &'static str, fields: &'static [FieldDef]) -> Self {
        Self { entity, fields }
    }

    /// Reject descriptors that cannot be turned into SQL.
    ///
    /// An empty field list is the "no schema" case; names must be bare identifiers.
    pub fn validate(&self) -> OrmResult<()> {
        if self.fields.is_empty() || check_ident(self.entity).is_err() {
            return Err(OrmError::InvalidEntity(self.entity.to_string()));
        }
        if self.fields.iter().any(|f| check_ident(f.name).is_err()) {
            return Err(OrmError::InvalidEntity(self.entity.to_string()));
        }
        Ok(())
    }

    pub fn field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|f| f.name)
    }

    /// Position of `name` in declaration order.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Field handle for `name`, checked against this schema.
    pub fn field(&self, name: &str) -> OrmResult<Field> {
        match self.position(name) {
            Some(idx) => Ok(Field::new(self.fields[idx].name)),
            None => Err(OrmError::unknown_field(self.entity, name)),
        }
    }

    /// Fresh handles for every field, in declaration order.
    pub fn handles(&self) -> Vec<Field> {
        self.field_names().map(Field::new).collect()
    }
}

/// A typed record shape mapped to one relation.
///
/// Usually derived with `#[derive(Entity)]`.
pub trait Entity: Sized {
    /// The schema descriptor for this entity kind.
    fn schema() -> &'static Schema;

    /// Field values in schema declaration order.
    fn to_values(&self) -> Vec<Value>;

    /// Build a record from values in schema declaration order.
    fn from_values(values: Vec<Value>) -> OrmResult<Self>;
}

/// Check the cell count of a row before a record is built from it.
pub fn expect_arity(schema: &Schema, values: &[Value]) -> OrmResult<()> {
    if values.len() != schema.fields.len() {
        return Err(OrmError::decode(
            schema.entity,
            format!(
                "expected {} values, got {}",
                schema.fields.len(),
                values.len()
            ),
        ));
    }
    Ok(())
}
