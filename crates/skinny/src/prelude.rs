//! Convenient imports for typical `skinny` usage.
//!
//! ```ignore
//! use skinny::prelude::*;
//! ```

pub use crate::{
    Entity, Expression, Field, OrmConfig, OrmError, OrmResult, Orm, Query, Store, Value, and_,
    eq, field, gt, gte, lt, lte, ne, or_,
};

#[cfg(feature = "sqlite")]
pub use crate::SqliteStore;
