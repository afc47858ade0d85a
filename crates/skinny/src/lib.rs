//! # skinny
//!
//! A skinny record mapper: typed records in, SQL out, rows back.
//!
//! ## Features
//!
//! - **Records, not rows**: declare a struct, derive [`Entity`], and the
//!   mapper handles the column list, placeholders and row conversion
//! - **Composable filters**: comparators chained with `and` / `or` render to a
//!   parameterised where-clause; values never touch the SQL text
//! - **Self-healing tables**: a missing table is created from the record
//!   schema and the statement retried once
//! - **Pluggable store**: any [`Store`] works; [`SqliteStore`] ships by default
//!
//! ## Example
//!
//! ```ignore
//! use skinny::prelude::*;
//!
//! #[derive(Debug, Clone, Entity)]
//! struct User {
//!     id: i64,
//!     name: String,
//!     percentage: f64,
//! }
//!
//! let mut orm = Orm::new(SqliteStore::open_in_memory()?);
//! orm.insert(&User { id: 1, name: "Naruto".into(), percentage: 0.9 })?;
//!
//! let users = orm
//!     .select::<User>()?
//!     .where_(field("id").gt(0).and(field("percentage").lt(1.0)))?
//!     .all()?;
//! ```

extern crate self as skinny;

pub mod config;
pub mod error;
pub mod expr;
pub mod ident;
pub mod marshal;
pub mod prelude;
pub mod schema;
pub mod session;
pub mod statement;
pub mod store;
pub mod value;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use config::OrmConfig;
pub use error::{OrmError, OrmResult, StoreError};
pub use expr::{
    CmpOp, Comparator, Connector, Expression, Field, and_, eq, field, gt, gte, lt, lte, ne, or_,
};
pub use marshal::Marshaler;
pub use schema::{Entity, FieldDef, FieldType, HasFieldType, Schema};
pub use session::{Mode, Orm, Phase, Query};
pub use statement::{BatchStatement, Statement};
pub use store::{Cursor, Store, StoreResult};
pub use value::{FromValue, Value};

#[cfg(feature = "sqlite")]
pub use sqlite::{SqliteCursor, SqliteStore};

#[cfg(feature = "derive")]
pub use skinny_derive::Entity;

/// Items the derive macro expands to. Not part of the public API.
#[doc(hidden)]
pub mod __private {
    pub use crate::schema::expect_arity;
}
