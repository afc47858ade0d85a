//! Derive macros for skinny
//!
//! Provides `#[derive(Entity)]`.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod entity;

/// Derive the `Entity` trait for a struct.
///
/// # Example
///
/// ```ignore
/// use skinny::Entity;
///
/// #[derive(Entity)]
/// #[orm(table = "Users")]
/// struct User {
///     id: i64,
///     name: String,
///     birth: chrono::NaiveDateTime,
///     #[orm(ty = "real")]
///     score: skinny::Value,
/// }
/// ```
///
/// # Generated
///
/// - `fn schema()` - a static descriptor listing every field in declaration order
/// - `fn to_values(&self)` - field values in declaration order
/// - `fn from_values(values)` - record construction from a positional row
///
/// # Attributes
///
/// - `#[orm(table = "name")]` - Entity (table) name; defaults to the struct name
/// - `#[orm(ty = "integer" | "text" | "real" | "timestamp")]` - Declared field
///   type; defaults to the field's `HasFieldType` mapping
#[proc_macro_derive(Entity, attributes(orm))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    entity::expand(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
