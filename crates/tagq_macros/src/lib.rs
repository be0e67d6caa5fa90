//! Procedural macros for tagq.
//!
//! `#[derive(Record)]` turns field annotations into the descriptor tables
//! the GraphQL and SQL builders read.
//!
//! # Example
//!
//! ```ignore
//! use tagq::Record;
//!
//! #[derive(Record)]
//! #[gql(rename = "Contract")]
//! pub struct ContractRow {
//!     #[db("id")]
//!     #[gql("id")]
//!     pub id: i64,
//!     #[db("name")]
//!     #[gql("name")]
//!     pub name: String,
//!     #[gql("units")]
//!     pub units: Vec<Unit>,
//! }
//! ```

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, Attribute, Data, DeriveInput, Fields, Ident, LitStr, Type};

/// Derive macro for tagged records.
///
/// # Attributes
///
/// - `#[gql("name")]` or `#[gql(name = "name")]` - GraphQL selection name
/// - `#[db("name")]` or `#[db(name = "name")]` - SQL column name
/// - `#[gql(rename = "Name")]` on the struct - root selection name
///
/// Fields without either attribute are ignored and their types need not
/// implement anything.
#[proc_macro_derive(Record, attributes(gql, db))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    derive_record_impl(&input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

struct FieldDef<'a> {
    ident: &'a Ident,
    ty: &'a Type,
    gql: Option<String>,
    db: Option<String>,
}

impl FieldDef<'_> {
    fn is_tagged(&self) -> bool {
        self.gql.is_some() || self.db.is_some()
    }
}

fn derive_record_impl(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let root_name = parse_container_attrs(&input.attrs)?.unwrap_or_else(|| name.to_string());
    let fields = parse_fields(input)?;

    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let declared = fields.iter().map(|field| {
        let ident = field.ident.to_string();
        let gql = option_tokens(field.gql.as_deref());
        let db = option_tokens(field.db.as_deref());
        let fty = field.ty;
        let ty = if field.is_tagged() {
            quote! { ::core::option::Option::Some(<#fty as ::tagq::reflect::Reflect>::type_info) }
        } else {
            quote! { ::core::option::Option::None }
        };
        quote! {
            ::tagq::reflect::DeclaredField {
                ident: #ident,
                gql: #gql,
                db: #db,
                ty: #ty,
            }
        }
    });

    let bindings = fields.iter().filter_map(|field| {
        let column = field.db.as_deref()?;
        let ident = field.ident;
        Some(quote! {
            (#column, ::tagq::sql::ToSqlValue::to_sql_value(&self.#ident))
        })
    });

    Ok(quote! {
        impl #impl_generics ::tagq::reflect::Record for #name #ty_generics #where_clause {
            const NAME: &'static str = #root_name;

            fn fields() -> ::std::vec::Vec<::tagq::reflect::DeclaredField> {
                ::std::vec![#(#declared),*]
            }
        }

        impl #impl_generics ::tagq::reflect::Reflect for #name #ty_generics #where_clause {
            fn type_info() -> ::tagq::reflect::TypeInfo {
                ::tagq::reflect::TypeInfo {
                    type_name: ::std::any::type_name::<Self>(),
                    kind: ::tagq::reflect::TypeKind::Composite(
                        <Self as ::tagq::reflect::Record>::fields,
                    ),
                }
            }
        }

        impl #impl_generics ::tagq::sql::Bindable for #name #ty_generics #where_clause {
            fn bind(&self) -> ::std::vec::Vec<(&'static str, ::tagq::sql::SqlValue)> {
                ::std::vec![#(#bindings),*]
            }
        }
    })
}

fn option_tokens(value: Option<&str>) -> TokenStream2 {
    match value {
        Some(value) => quote! { ::core::option::Option::Some(#value) },
        None => quote! { ::core::option::Option::None },
    }
}

fn parse_fields(input: &DeriveInput) -> syn::Result<Vec<FieldDef<'_>>> {
    let Data::Struct(data) = &input.data else {
        return Err(syn::Error::new_spanned(
            &input.ident,
            "Record can only be derived for structs",
        ));
    };
    let Fields::Named(named) = &data.fields else {
        return Err(syn::Error::new_spanned(
            &data.fields,
            "Record requires a struct with named fields",
        ));
    };

    named
        .named
        .iter()
        .map(|field| {
            let mut def = FieldDef {
                // Named fields always carry an ident.
                ident: field.ident.as_ref().ok_or_else(|| {
                    syn::Error::new_spanned(field, "Record requires named fields")
                })?,
                ty: &field.ty,
                gql: None,
                db: None,
            };

            for attr in &field.attrs {
                let slot = if attr.path().is_ident("gql") {
                    &mut def.gql
                } else if attr.path().is_ident("db") {
                    &mut def.db
                } else {
                    continue;
                };
                if slot.is_some() {
                    return Err(syn::Error::new_spanned(attr, "duplicate tag attribute"));
                }
                *slot = Some(parse_field_tag(attr)?);
            }

            Ok(def)
        })
        .collect()
}

fn parse_field_tag(attr: &Attribute) -> syn::Result<String> {
    if let Ok(value) = attr.parse_args::<LitStr>() {
        return Ok(value.value());
    }

    let mut name = None;
    attr.parse_nested_meta(|meta| {
        if meta.path.is_ident("name") {
            let value: LitStr = meta.value()?.parse()?;
            name = Some(value.value());
            Ok(())
        } else {
            Err(meta.error("expected a string literal or `name = \"...\"`"))
        }
    })?;

    name.ok_or_else(|| syn::Error::new_spanned(attr, "missing tag name"))
}

fn parse_container_attrs(attrs: &[Attribute]) -> syn::Result<Option<String>> {
    let mut rename = None;

    for attr in attrs {
        if attr.path().is_ident("gql") {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("rename") {
                    let value: LitStr = meta.value()?.parse()?;
                    rename = Some(value.value());
                    Ok(())
                } else {
                    Err(meta.error("expected `rename = \"...\"`"))
                }
            })?;
        } else if attr.path().is_ident("db") {
            return Err(syn::Error::new_spanned(
                attr,
                "`db` is a field attribute; pass the table name to the builder",
            ));
        }
    }

    Ok(rename)
}
