//! Attribute parsing for the Entity derive macro.
//!
//! Handles struct-level `#[orm(table = "...")]` and field-level
//! `#[orm(ty = "...")]`.

use syn::{Attribute, DeriveInput, LitStr, Result};

/// One `key = "value"` pair inside `#[orm(...)]`.
struct OrmPair {
    key: syn::Ident,
    value: LitStr,
}

/// Every pair of one `#[orm(...)]` attribute.
struct OrmPairs(Vec<OrmPair>);

impl syn::parse::Parse for OrmPairs {
    fn parse(input: syn::parse::ParseStream) -> Result<Self> {
        let mut pairs = Vec::new();
        while !input.is_empty() {
            let key: syn::Ident = input.parse()?;
            let _: syn::Token![=] = input.parse()?;
            let value: LitStr = input.parse()?;
            pairs.push(OrmPair { key, value });

            if input.peek(syn::Token![,]) {
                let _: syn::Token![,] = input.parse()?;
            } else {
                break;
            }
        }
        Ok(OrmPairs(pairs))
    }
}

fn orm_pairs(attrs: &[Attribute]) -> Result<Vec<OrmPair>> {
    let mut out = Vec::new();
    for attr in attrs {
        if attr.path().is_ident("orm") {
            out.extend(attr.parse_args::<OrmPairs>()?.0);
        }
    }
    Ok(out)
}

/// Entity name: `#[orm(table = "...")]` or the struct name.
pub(super) fn get_entity_name(input: &DeriveInput) -> Result<String> {
    let mut name = None;
    for pair in orm_pairs(&input.attrs)? {
        if pair.key == "table" {
            name = Some(pair.value.value());
        } else {
            return Err(syn::Error::new_spanned(
                &pair.key,
                "unknown struct attribute, expected `table`",
            ));
        }
    }
    Ok(name.unwrap_or_else(|| input.ident.to_string()))
}

/// Declared type override from `#[orm(ty = "...")]`, as a `FieldType` variant.
pub(super) fn get_type_override(field: &syn::Field) -> Result<Option<syn::Ident>> {
    let mut ty = None;
    for pair in orm_pairs(&field.attrs)? {
        if pair.key != "ty" {
            return Err(syn::Error::new_spanned(
                &pair.key,
                "unknown field attribute, expected `ty`",
            ));
        }
        let variant = match pair.value.value().as_str() {
            "integer" => "Integer",
            "text" => "Text",
            "real" => "Real",
            "timestamp" => "Timestamp",
            _ => {
                return Err(syn::Error::new_spanned(
                    &pair.value,
                    "expected one of \"integer\", \"text\", \"real\", \"timestamp\"",
                ));
            }
        };
        ty = Some(syn::Ident::new(variant, pair.value.span()));
    }
    Ok(ty)
}
