//! Entity derive macro implementation

mod attrs;

use proc_macro2::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields, Result};

pub fn expand(input: DeriveInput) -> Result<TokenStream> {
    let name = &input.ident;

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Entity cannot be derived for generic structs",
        ));
    }

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    &input,
                    "Entity can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input,
                "Entity can only be derived for structs",
            ));
        }
    };

    let entity_name = attrs::get_entity_name(&input)?;

    let mut field_defs = Vec::with_capacity(fields.len());
    let mut to_values = Vec::with_capacity(fields.len());
    let mut from_values = Vec::with_capacity(fields.len());

    for field in fields {
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };
        let column = ident.to_string();
        let ty = &field.ty;

        let field_type = match attrs::get_type_override(field)? {
            Some(variant) => quote! { ::skinny::FieldType::#variant },
            None => quote! { <#ty as ::skinny::HasFieldType>::FIELD_TYPE },
        };
        field_defs.push(quote! {
            ::skinny::FieldDef::new(#column, #field_type)
        });
        to_values.push(quote! {
            ::skinny::Value::from(::core::clone::Clone::clone(&self.#ident))
        });
        from_values.push(quote! {
            #ident: ::skinny::FromValue::from_value(
                values.next().unwrap_or(::skinny::Value::Null),
                #column,
            )?
        });
    }

    Ok(quote! {
        impl ::skinny::Entity for #name {
            fn schema() -> &'static ::skinny::Schema {
                static SCHEMA: ::skinny::Schema = ::skinny::Schema::new(
                    #entity_name,
                    &[#(#field_defs),*],
                );
                &SCHEMA
            }

            fn to_values(&self) -> ::std::vec::Vec<::skinny::Value> {
                ::std::vec![#(#to_values),*]
            }

            fn from_values(
                values: ::std::vec::Vec<::skinny::Value>,
            ) -> ::skinny::OrmResult<Self> {
                ::skinny::__private::expect_arity(
                    <Self as ::skinny::Entity>::schema(),
                    &values,
                )?;
                #[allow(unused_mut, unused_variables)]
                let mut values = values.into_iter();
                ::core::result::Result::Ok(Self {
                    #(#from_values),*
                })
            }
        }
    })
}
