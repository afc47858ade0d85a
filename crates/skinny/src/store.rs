//! Store connector capability traits.
//!
//! The mapper never talks to a database directly: it asks a [`Store`] for a
//! short-lived [`Cursor`], runs exactly one round-trip through it, and drops
//! it. Dropping the cursor is the release, so it happens on every exit path,
//! including `?` returns, before the error reaches the caller.

use crate::error::StoreError;
use crate::value::Value;

/// Result type for store connector calls.
pub type StoreResult<T> = Result<T, StoreError>;

/// One round-trip handle.
pub trait Cursor {
    /// Execute one statement, returning the affected row count.
    fn execute(&mut self, sql: &str, params: &[Value]) -> StoreResult<u64>;

    /// Execute one statement once per parameter row, as a single batch.
    fn execute_many(&mut self, sql: &str, rows: &[Vec<Value>]) -> StoreResult<()>;

    /// Execute a query and return every row.
    fn fetch_all(&mut self, sql: &str, params: &[Value]) -> StoreResult<Vec<Vec<Value>>>;

    /// Execute a query and return the first row, if any.
    fn fetch_one(&mut self, sql: &str, params: &[Value]) -> StoreResult<Option<Vec<Value>>>;
}

/// A connection the mapper can open cursors on.
///
/// Implementations are expected to be used from one thread at a time; the
/// mapper session holds its store exclusively.
pub trait Store {
    type Cursor<'a>: Cursor
    where
        Self: 'a;

    /// Acquire a cursor for one round-trip.
    fn cursor(&mut self) -> StoreResult<Self::Cursor<'_>>;

    /// Make the effects of previous statements durable.
    fn commit(&mut self) -> StoreResult<()>;
}
