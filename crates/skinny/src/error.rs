//! Error types for skinny

use thiserror::Error;

/// Result type alias for skinny operations
pub type OrmResult<T> = Result<T, OrmError>;

/// Errors raised by a store connector.
///
/// Only one store condition is recognized by the session: a missing relation.
/// Everything else is carried opaquely and propagated to the caller unchanged.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The target relation (table) does not exist.
    #[error("missing relation: {message}")]
    MissingRelation { message: String },

    /// Any other backend failure.
    #[error("{0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl StoreError {
    /// Create a missing relation error
    pub fn missing_relation(message: impl Into<String>) -> Self {
        Self::MissingRelation {
            message: message.into(),
        }
    }

    /// Wrap a backend error
    pub fn backend(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Backend(Box::new(err))
    }

    /// Check if this is the missing relation condition
    pub fn is_missing_relation(&self) -> bool {
        matches!(self, Self::MissingRelation { .. })
    }
}

/// Error types for mapper operations
#[derive(Debug, Error)]
pub enum OrmError {
    /// The bound type has no usable schema descriptor
    #[error("'{0}' is not a valid Entity to select from")]
    InvalidEntity(String),

    /// A comparator or key refers to a field the entity does not declare
    #[error("Entity '{entity}' has no field '{field}'")]
    UnknownField { entity: String, field: String },

    /// A `set` clause was built from a non-equality comparator
    #[error("The comparator used in the 'set' clause is not valid: '{0}'")]
    InvalidSetComparator(&'static str),

    /// Row value could not be coerced to the declared field type
    #[error("Impossible to parse {field} to {ty}")]
    Parse { field: String, ty: String },

    /// Strict value -> Rust field conversion failed
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// The operation is declared but not supported
    #[error("Unimplemented operation: {0}")]
    Unimplemented(&'static str),

    /// `limit` received a value that is not a usable row count
    #[error("Invalid limit: {0}")]
    InvalidLimit(String),

    /// An update reached `where_` with no `set` clause
    #[error("Update on '{0}' has no set clause")]
    EmptySet(String),

    /// A delete or update reached `where_` with an empty condition
    #[error("{0} on '{1}' has an empty where clause")]
    EmptyWhere(&'static str, String),

    /// `using` was called without key fields
    #[error("Update on '{0}' needs at least one key field")]
    NoKeys(String),

    /// `using`/`bulk_update` without source records
    #[error("No pending records to update")]
    NoPendingRecords,

    /// A verb was called in a mode that does not support it
    #[error("Invalid state: {0}")]
    InvalidState(&'static str),

    /// The query handle was already consumed by a terminal execution
    #[error("Statement already executed")]
    AlreadyExecuted,

    /// Store connector error
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl OrmError {
    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a parse error for a field and its declared type
    pub fn parse(field: impl Into<String>, ty: impl std::fmt::Display) -> Self {
        Self::Parse {
            field: field.into(),
            ty: ty.to_string(),
        }
    }

    /// Create an unknown field error
    pub fn unknown_field(entity: impl Into<String>, field: impl Into<String>) -> Self {
        Self::UnknownField {
            entity: entity.into(),
            field: field.into(),
        }
    }

    /// Check if this is a parse error
    pub fn is_parse(&self) -> bool {
        matches!(self, Self::Parse { .. })
    }

    /// Check if this is an invalid entity error
    pub fn is_invalid_entity(&self) -> bool {
        matches!(self, Self::InvalidEntity(_))
    }

    /// Check if this is the store's missing relation condition
    pub fn is_missing_relation(&self) -> bool {
        matches!(self, Self::Store(err) if err.is_missing_relation())
    }
}
