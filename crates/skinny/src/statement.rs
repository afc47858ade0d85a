//! Statement generation.
//!
//! Pure functions from a [`Schema`] plus clause state to SQL text and
//! positional parameters. Nothing here touches a store.
//!
//! The dialect is fixed: `?` placeholders and `CREATE TABLE "<Entity>"(...)`.
//!
//! ```
//! use skinny::{FieldDef, FieldType, Schema, statement};
//!
//! const USER: Schema = Schema::new(
//!     "User",
//!     &[
//!         FieldDef::new("id", FieldType::Integer),
//!         FieldDef::new("name", FieldType::Text),
//!     ],
//! );
//! assert_eq!(statement::select_sql(&USER), "select User.id, User.name from User");
//! ```

use crate::error::{OrmError, OrmResult};
use crate::expr::{CmpOp, Expression, Field};
use crate::schema::{Schema, expect_arity};
use crate::value::Value;

/// Leading keyword of a rendered where-clause.
pub const WHERE_PREFIX: &str = "where ";
/// Leading keyword of a rendered set-clause.
pub const SET_PREFIX: &str = "set ";

/// SQL text plus one row of positional parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
}

/// SQL text executed once per parameter row.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchStatement {
    pub sql: String,
    pub rows: Vec<Vec<Value>>,
}

/// `select E.f1, E.f2, ... from E`, fields in declaration order.
pub fn select_sql(schema: &Schema) -> String {
    let columns = schema
        .field_names()
        .map(|name| format!("{}.{}", schema.entity, name))
        .collect::<Vec<_>>()
        .join(", ");
    format!("select {} from {}", columns, schema.entity)
}

/// `INSERT INTO E (f1, f2, ...) VALUES (?, ?, ...)`
pub fn insert_sql(schema: &Schema) -> String {
    let columns = schema.field_names().collect::<Vec<_>>().join(", ");
    let placeholders = vec!["?"; schema.fields.len()].join(", ");
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        schema.entity, columns, placeholders
    )
}

/// `delete from E`
pub fn delete_sql(schema: &Schema) -> String {
    format!("delete from {}", schema.entity)
}

/// `update E`
pub fn update_sql(schema: &Schema) -> String {
    format!("update {}", schema.entity)
}

/// `CREATE TABLE "E"(f1 TYPE1, f2 TYPE2, ...)`
pub fn create_table_sql(schema: &Schema) -> String {
    let columns = schema
        .fields
        .iter()
        .map(|f| format!("{} {}", f.name, f.ty.sql_type()))
        .collect::<Vec<_>>()
        .join(", ");
    format!("CREATE TABLE \"{}\"({})", schema.entity, columns)
}

/// Insert for one record's values (schema order).
pub fn insert(schema: &Schema, values: Vec<Value>) -> Statement {
    Statement {
        sql: insert_sql(schema),
        params: values,
    }
}

/// One insert template executed once per record.
pub fn bulk_insert(schema: &Schema, rows: Vec<Vec<Value>>) -> BatchStatement {
    BatchStatement {
        sql: insert_sql(schema),
        rows,
    }
}

fn check_fields(schema: &Schema, expr: &Expression) -> OrmResult<()> {
    for cmp in expr.comparators() {
        if schema.position(cmp.field()).is_none() {
            return Err(OrmError::unknown_field(schema.entity, cmp.field()));
        }
    }
    Ok(())
}

/// Append `expr` to a where-clause.
///
/// Each comparator renders as `E.field op ? ` and pushes its operand; after
/// each comparator the next unused connector (if any) is emitted. An empty
/// clause is started with `where `; a non-empty one is continued with `and `.
/// Fields are checked before anything is written; an empty expression writes
/// nothing.
pub fn render_where(
    schema: &Schema,
    expr: &Expression,
    clause: &mut String,
    params: &mut Vec<Value>,
) -> OrmResult<()> {
    check_fields(schema, expr)?;
    if expr.is_empty() {
        return Ok(());
    }

    if clause.is_empty() {
        clause.push_str(WHERE_PREFIX);
    } else {
        clause.push_str("and ");
    }

    let mut connectors = expr.connectors().iter();
    for cmp in expr.comparators() {
        params.push(cmp.value().clone());
        clause.push_str(&format!(
            "{}.{} {} ? ",
            schema.entity,
            cmp.field(),
            cmp.op()
        ));
        if let Some(connector) = connectors.next() {
            clause.push_str(connector.as_sql());
            clause.push(' ');
        }
    }
    Ok(())
}

/// Append assignments to a set-clause.
///
/// Every comparator in `expr` must be an equality; each renders as
/// `field = ? `, comma-separated after the first assignment of the clause.
/// Operands are pushed to `params` immediately. Nothing is written if any
/// comparator is rejected.
pub fn render_set(
    schema: &Schema,
    expr: &Expression,
    clause: &mut String,
    params: &mut Vec<Value>,
) -> OrmResult<()> {
    if let Some(bad) = expr.comparators().iter().find(|c| c.op() != CmpOp::Eq) {
        return Err(OrmError::InvalidSetComparator(bad.op().as_sql()));
    }
    check_fields(schema, expr)?;

    for cmp in expr.comparators() {
        if clause.is_empty() {
            clause.push_str(SET_PREFIX);
        } else {
            clause.push_str(", ");
        }
        clause.push_str(&format!("{} {} ? ", cmp.field(), cmp.op()));
        params.push(cmp.value().clone());
    }
    Ok(())
}

/// Full-row update keyed on `keys`, one parameter row per record.
///
/// SQL: `update E set f1 = ?, f2 = ?, ... where k1 = ? and k2 = ?`.
/// Each row is the record's values in schema order followed by its key values.
/// At least one key is required.
pub fn render_using(
    schema: &Schema,
    keys: &[Field],
    records: &[Vec<Value>],
) -> OrmResult<BatchStatement> {
    if keys.is_empty() {
        return Err(OrmError::NoKeys(schema.entity.to_string()));
    }
    let mut key_positions = Vec::with_capacity(keys.len());
    for key in keys {
        match schema.position(key.name()) {
            Some(idx) => key_positions.push(idx),
            None => return Err(OrmError::unknown_field(schema.entity, key.name())),
        }
    }

    let assignments = schema
        .field_names()
        .map(|name| format!("{name} = ?"))
        .collect::<Vec<_>>()
        .join(", ");
    let mut sql = format!("{} {}{}", update_sql(schema), SET_PREFIX, assignments);
    let matches = keys
        .iter()
        .map(|k| format!("{} = ?", k.name()))
        .collect::<Vec<_>>()
        .join(" and ");
    sql.push(' ');
    sql.push_str(WHERE_PREFIX);
    sql.push_str(&matches);

    let mut rows = Vec::with_capacity(records.len());
    for values in records {
        expect_arity(schema, values)?;
        let mut row = values.clone();
        row.extend(key_positions.iter().map(|&idx| values[idx].clone()));
        rows.push(row);
    }

    Ok(BatchStatement { sql, rows })
}
