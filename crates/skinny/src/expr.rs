//! Expression builder for where/set clauses.
//!
//! Comparisons are built from a [`Field`] handle and combined with explicit
//! [`Expression::and`] / [`Expression::or`] calls:
//!
//! ```
//! use skinny::expr::{field, Connector};
//!
//! let expr = field("id").gt(5).and(field("age").lt(7));
//! assert_eq!(expr.comparators().len(), 2);
//! assert_eq!(expr.connectors(), &[Connector::And]);
//! ```
//!
//! An expression is flat: an ordered comparator list plus an ordered connector
//! list. Each combine appends the right-hand comparators and one connector, so
//! rendering interleaves connectors left to right. There is no grouping;
//! `a.or(b).and(c)` renders as `a or b and c`.

use crate::value::Value;
use std::fmt;

/// Comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CmpOp {
    Eq,
    Gt,
    Gte,
    Lte,
    Lt,
    Ne,
}

impl CmpOp {
    pub const fn as_sql(self) -> &'static str {
        match self {
            CmpOp::Eq => "=",
            CmpOp::Gt => ">",
            CmpOp::Gte => ">=",
            CmpOp::Lte => "<=",
            CmpOp::Lt => "<",
            CmpOp::Ne => "!=",
        }
    }
}

impl fmt::Display for CmpOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// Boolean connector between comparator groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Connector {
    And,
    Or,
}

impl Connector {
    pub const fn as_sql(self) -> &'static str {
        match self {
            Connector::And => "and",
            Connector::Or => "or",
        }
    }
}

/// Handle naming one schema field; the entry point for comparators.
///
/// Handles are plain values created per call. Use [`crate::Schema::field`] or
/// [`crate::Query::field`] when the name should be checked up front; otherwise
/// it is checked when the clause is rendered.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Field {
    name: String,
}

impl Field {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn compare(&self, op: CmpOp, value: impl Into<Value>) -> Expression {
        Expression::from(Comparator {
            field: self.name.clone(),
            op,
            value: value.into(),
        })
    }

    /// `field = value`
    pub fn eq(&self, value: impl Into<Value>) -> Expression {
        self.compare(CmpOp::Eq, value)
    }

    /// `field != value`
    pub fn ne(&self, value: impl Into<Value>) -> Expression {
        self.compare(CmpOp::Ne, value)
    }

    /// `field > value`
    pub fn gt(&self, value: impl Into<Value>) -> Expression {
        self.compare(CmpOp::Gt, value)
    }

    /// `field >= value`
    pub fn gte(&self, value: impl Into<Value>) -> Expression {
        self.compare(CmpOp::Gte, value)
    }

    /// `field < value`
    pub fn lt(&self, value: impl Into<Value>) -> Expression {
        self.compare(CmpOp::Lt, value)
    }

    /// `field <= value`
    pub fn lte(&self, value: impl Into<Value>) -> Expression {
        self.compare(CmpOp::Lte, value)
    }
}

impl From<&str> for Field {
    fn from(name: &str) -> Self {
        Field::new(name)
    }
}

impl From<String> for Field {
    fn from(name: String) -> Self {
        Field::new(name)
    }
}

impl From<&Field> for Field {
    fn from(field: &Field) -> Self {
        field.clone()
    }
}

/// One `field op value` predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparator {
    field: String,
    op: CmpOp,
    value: Value,
}

impl Comparator {
    pub fn new(field: impl Into<String>, op: CmpOp, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn op(&self) -> CmpOp {
        self.op
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn into_value(self) -> Value {
        self.value
    }
}

/// Ordered comparators plus the connectors recorded between merges.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Expression {
    comparators: Vec<Comparator>,
    connectors: Vec<Connector>,
}

impl From<Comparator> for Expression {
    fn from(comparator: Comparator) -> Self {
        Self {
            comparators: vec![comparator],
            connectors: Vec::new(),
        }
    }
}

impl Expression {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge `other`'s comparators after this one's, joined by `and`.
    pub fn and(self, other: Expression) -> Self {
        self.merge(Connector::And, other)
    }

    /// Merge `other`'s comparators after this one's, joined by `or`.
    ///
    /// `or` merges exactly like `and`; only the connector differs.
    pub fn or(self, other: Expression) -> Self {
        self.merge(Connector::Or, other)
    }

    /// Append a comparator without recording a connector.
    pub fn push(mut self, comparator: Comparator) -> Self {
        self.comparators.push(comparator);
        self
    }

    /// An empty side contributes no connector.
    fn merge(mut self, connector: Connector, other: Expression) -> Self {
        if other.is_empty() {
            return self;
        }
        if self.is_empty() {
            return other;
        }
        self.comparators.extend(other.comparators);
        self.connectors.push(connector);
        self.connectors.extend(other.connectors);
        self
    }

    pub fn comparators(&self) -> &[Comparator] {
        &self.comparators
    }

    pub fn connectors(&self) -> &[Connector] {
        &self.connectors
    }

    pub fn is_empty(&self) -> bool {
        self.comparators.is_empty()
    }

    pub fn into_parts(self) -> (Vec<Comparator>, Vec<Connector>) {
        (self.comparators, self.connectors)
    }
}

/// Handle for the field called `name`.
pub fn field(name: impl Into<String>) -> Field {
    Field::new(name)
}

/// `field = value`
pub fn eq(field: impl Into<Field>, value: impl Into<Value>) -> Expression {
    Into::<Field>::into(field).eq(value)
}

/// `field != value`
pub fn ne(field: impl Into<Field>, value: impl Into<Value>) -> Expression {
    Into::<Field>::into(field).ne(value)
}

/// `field > value`
pub fn gt(field: impl Into<Field>, value: impl Into<Value>) -> Expression {
    Into::<Field>::into(field).gt(value)
}

/// `field >= value`
pub fn gte(field: impl Into<Field>, value: impl Into<Value>) -> Expression {
    Into::<Field>::into(field).gte(value)
}

/// `field < value`
pub fn lt(field: impl Into<Field>, value: impl Into<Value>) -> Expression {
    Into::<Field>::into(field).lt(value)
}

/// `field <= value`
pub fn lte(field: impl Into<Field>, value: impl Into<Value>) -> Expression {
    Into::<Field>::into(field).lte(value)
}

/// `left and right`
pub fn and_(left: Expression, right: Expression) -> Expression {
    left.and(right)
}

/// `left or right`
pub fn or_(left: Expression, right: Expression) -> Expression {
    left.or(right)
}
