//! Session configuration.

/// Construction-time options for [`crate::Orm`].
///
/// Both options default to `true`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrmConfig {
    /// Create a missing table from the entity schema and retry once.
    pub create_tables_if_not_exists: bool,
    /// Coerce fetched cells to their declared field types.
    pub parse_fields: bool,
}

impl Default for OrmConfig {
    fn default() -> Self {
        Self {
            create_tables_if_not_exists: true,
            parse_fields: true,
        }
    }
}

impl OrmConfig {
    /// Create a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable reactive table creation.
    ///
    /// When disabled, a missing-relation error from the store propagates
    /// unchanged.
    pub fn create_tables_if_not_exists(mut self, enabled: bool) -> Self {
        self.create_tables_if_not_exists = enabled;
        self
    }

    /// Enable or disable row coercion.
    ///
    /// When disabled, rows are handed to the record constructor as fetched;
    /// field types must already be assignment-compatible.
    pub fn parse_fields(mut self, enabled: bool) -> Self {
        self.parse_fields = enabled;
        self
    }
}
