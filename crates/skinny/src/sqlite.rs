//! Bundled store connector over `rusqlite`.
//!
//! ```ignore
//! use skinny::{Orm, SqliteStore};
//!
//! let mut orm = Orm::new(SqliteStore::open_in_memory()?);
//! ```
//!
//! The connection starts in autocommit mode, so every statement is durable as
//! soon as it runs and [`Store::commit`] is a no-op. Call
//! [`SqliteStore::begin`] to group statements; the session's commit then ends
//! the transaction.

use crate::error::StoreError;
use crate::store::{Cursor, Store, StoreResult};
use crate::value::Value;
use rusqlite::types::{ToSql, ToSqlOutput, ValueRef};
use rusqlite::{Connection, params_from_iter};
use std::path::Path;

/// Store connector owning one SQLite connection.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open a private in-memory database.
    pub fn open_in_memory() -> StoreResult<Self> {
        Connection::open_in_memory()
            .map(Self::from_connection)
            .map_err(map_err)
    }

    /// Open (or create) a database file.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Connection::open(path)
            .map(Self::from_connection)
            .map_err(map_err)
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    /// The underlying connection, for statements the mapper does not build.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn into_connection(self) -> Connection {
        self.conn
    }

    /// Open an explicit transaction, ended by the next commit.
    pub fn begin(&mut self) -> StoreResult<()> {
        self.conn.execute_batch("BEGIN").map_err(map_err)
    }

    /// Whether the connection is outside an explicit transaction.
    pub fn is_autocommit(&self) -> bool {
        self.conn.is_autocommit()
    }
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore")
            .field("path", &self.conn.path())
            .field("autocommit", &self.conn.is_autocommit())
            .finish()
    }
}

impl Store for SqliteStore {
    type Cursor<'a> = SqliteCursor<'a>;

    fn cursor(&mut self) -> StoreResult<SqliteCursor<'_>> {
        Ok(SqliteCursor {
            conn: &mut self.conn,
        })
    }

    fn commit(&mut self) -> StoreResult<()> {
        if self.conn.is_autocommit() {
            return Ok(());
        }
        self.conn.execute_batch("COMMIT").map_err(map_err)
    }
}

/// One round-trip over a borrowed connection.
pub struct SqliteCursor<'c> {
    conn: &'c mut Connection,
}

impl Cursor for SqliteCursor<'_> {
    fn execute(&mut self, sql: &str, params: &[Value]) -> StoreResult<u64> {
        let changed = self
            .conn
            .execute(sql, params_from_iter(params.iter()))
            .map_err(map_err)?;
        Ok(changed as u64)
    }

    fn execute_many(&mut self, sql: &str, rows: &[Vec<Value>]) -> StoreResult<()> {
        // A savepoint nests inside an explicit transaction and acts as one
        // outside it, so the batch lands whole or not at all.
        let sp = self.conn.savepoint().map_err(map_err)?;
        {
            let mut stmt = sp.prepare(sql).map_err(map_err)?;
            for row in rows {
                stmt.execute(params_from_iter(row.iter())).map_err(map_err)?;
            }
        }
        sp.commit().map_err(map_err)
    }

    fn fetch_all(&mut self, sql: &str, params: &[Value]) -> StoreResult<Vec<Vec<Value>>> {
        let mut stmt = self.conn.prepare(sql).map_err(map_err)?;
        let width = stmt.column_count();
        let mut rows = stmt.query(params_from_iter(params.iter())).map_err(map_err)?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().map_err(map_err)? {
            out.push(read_row(row, width)?);
        }
        Ok(out)
    }

    fn fetch_one(&mut self, sql: &str, params: &[Value]) -> StoreResult<Option<Vec<Value>>> {
        let mut stmt = self.conn.prepare(sql).map_err(map_err)?;
        let width = stmt.column_count();
        let mut rows = stmt.query(params_from_iter(params.iter())).map_err(map_err)?;
        match rows.next().map_err(map_err)? {
            Some(row) => read_row(row, width).map(Some),
            None => Ok(None),
        }
    }
}

fn read_row(row: &rusqlite::Row<'_>, width: usize) -> StoreResult<Vec<Value>> {
    (0..width)
        .map(|idx| row.get_ref(idx).map(from_value_ref).map_err(map_err))
        .collect()
}

fn from_value_ref(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(v) => Value::Integer(v),
        ValueRef::Real(v) => Value::Real(v),
        ValueRef::Text(bytes) => Value::Text(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Value::Blob(bytes.to_vec()),
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::Borrowed(ValueRef::Null),
            Value::Integer(v) => ToSqlOutput::from(*v),
            Value::Real(v) => ToSqlOutput::from(*v),
            Value::Text(s) => ToSqlOutput::from(s.as_str()),
            Value::Blob(b) => ToSqlOutput::from(b.as_slice()),
            Value::Timestamp(ts) => ToSqlOutput::from(Value::timestamp_text(ts)),
        })
    }
}

fn map_err(err: rusqlite::Error) -> StoreError {
    match &err {
        rusqlite::Error::SqliteFailure(_, Some(message)) if message.starts_with("no such table") => {
            StoreError::missing_relation(message.clone())
        }
        _ => StoreError::backend(err),
    }
}
