//! This crate only contains the `#[derive(Entity)]` proc-macro for Guava.
//! For documentation, please see the main [`guava`][1] crate.
//!
//! [1]: https://docs.rs/guava

#![doc(html_root_url = "https://docs.rs/guava_derive/0.1.0")]
#![warn(missing_debug_implementations, missing_copy_implementations,
        trivial_casts, trivial_numeric_casts,
        unsafe_code,
        unstable_features,
        unused_import_braces, unused_qualifications)]
#![allow(clippy::single_match, clippy::match_same_arms, clippy::match_ref_pats,
         clippy::clone_on_ref_ptr, clippy::needless_pass_by_value)]
#![warn(clippy::used_underscore_binding,
        clippy::similar_names,
        clippy::missing_docs_in_private_items,
        clippy::non_ascii_literal, clippy::unicode_not_nfc,
        clippy::unwrap_used, clippy::expect_used,
        clippy::shadow_unrelated,
        clippy::int_plus_one, clippy::string_add_assign, clippy::if_not_else,
        clippy::mut_mut, clippy::items_after_statements,
        clippy::print_stdout, clippy::mem_forget)]

#[macro_use]
extern crate quote;
extern crate proc_macro;

#[macro_use]
mod error;
mod case;
mod meta;
mod marker;
mod option;

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use syn::{ DeriveInput, Data, Fields, Field, Ident, Type };
use self::{
    error::{ Result, err_msg },
    meta::{ SerdeContainer, SerdeField },
    marker::{ CollectionAttr, FieldAttrs },
    option::EntityOptions,
};

/// The top-level entry point of this proc-macro. Only here to be exported
/// and to turn `Result::Err` return values into compile errors.
#[proc_macro_derive(Entity, attributes(
    collection, options,
    unique_index, single_field_index, geospatial_index, compound_index,
    lowercase, uppercase, timestamps,
))]
pub fn derive_guava_entity(input: TokenStream) -> TokenStream {
    let parsed_ast = syn::parse_macro_input!(input as DeriveInput);

    impl_guava_entity(&parsed_ast)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

/// A field stored in the document, along with its markers.
#[derive(Debug)]
struct StoredField<'a> {
    /// The field as declared.
    field: &'a Field,
    /// The Rust name of the field.
    ident: &'a Ident,
    /// The key the field is serialized under.
    name: String,
    /// Whether the field is `#[serde(flatten)]`ed.
    flatten: bool,
    /// Its guava attributes.
    attrs: FieldAttrs,
}

/// Implements `Entity` for the specified type.
fn impl_guava_entity(input: &DeriveInput) -> Result<TokenStream2> {
    let fields = match input.data {
        Data::Struct(ref data) => match data.fields {
            Fields::Named(ref fields) => &fields.named,
            _ => return err_msg(
                &input.ident,
                "only `struct`s with named fields can be entities",
            ),
        },
        _ => return err_msg(
            &input.ident,
            "only `struct`s can be entities; consider wrapping this type in a struct with an `_id` field",
        ),
    };

    let container = SerdeContainer::from_attributes(&input.attrs)?;
    let collection = CollectionAttr::from_attributes(&input.attrs)?;
    let options = EntityOptions::from_attributes(&input.attrs)?;
    let stored = stored_fields(fields.iter(), &container)?;

    let (id_ident, id_type) = id_field(input, &stored)?;
    let schema = impl_schema(&container, collection.as_ref(), &stored);
    let timestamps = impl_timestamps(input, collection.as_ref(), &stored)?;
    let normalize_case = impl_normalize_case(&stored);

    let ty = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::guava::entity::Entity for #ty #ty_generics #where_clause {
            type Id = #id_type;

            fn id(&self) -> &Self::Id {
                &self.#id_ident
            }

            #schema
            #timestamps
            #normalize_case
            #options
        }
    })
}

/// Collects the fields which end up in the stored document. Markers on
/// skipped fields are rejected.
fn stored_fields<'a, I>(fields: I, container: &SerdeContainer) -> Result<Vec<StoredField<'a>>>
    where I: IntoIterator<Item = &'a Field>
{
    let mut stored = Vec::new();

    for field in fields {
        let ident = match field.ident {
            Some(ref ident) => ident,
            None => return err_msg(field, "entity fields must be named"),
        };
        let serde = SerdeField::from_attributes(&field.attrs)?;
        let attrs = FieldAttrs::from_attributes(&field.attrs)?;

        if serde.skip {
            if let Some(ref attr) = attrs.first {
                return err_msg(attr, "a field that is never serialized can't carry markers");
            }
            if attrs.timestamps {
                return err_msg(field, "the `#[timestamps]` field must be serialized");
            }
            continue;
        }

        if serde.flatten {
            if let Some(ref attr) = attrs.first {
                return err_msg(attr, "a `#[serde(flatten)]` field can't carry markers");
            }
        }

        let raw_name = ident.to_string();
        let name = serde.serialized_name(raw_name.trim_start_matches("r#"), container);

        stored.push(StoredField {
            field,
            ident,
            name,
            flatten: serde.flatten,
            attrs,
        });
    }

    Ok(stored)
}

/// Finds the one field serialized as `_id`.
fn id_field<'a>(input: &DeriveInput, stored: &[StoredField<'a>]) -> Result<(&'a Ident, &'a Type)> {
    let mut ids = stored.iter().filter(|field| !field.flatten && field.name == "_id");

    match (ids.next(), ids.next()) {
        (Some(id), None) => Ok((id.ident, &id.field.ty)),
        (None, _) => err_msg(
            &input.ident,
            "an entity must have a field serialized as `_id`; add `#[serde(rename = \"_id\")]`",
        ),
        (Some(_), Some(second)) => err_msg(second.field, "more than one field is serialized as `_id`"),
    }
}

/// The `schema()` method: the marker table built from the attributes.
fn impl_schema(
    container: &SerdeContainer,
    collection: Option<&CollectionAttr>,
    stored: &[StoredField],
) -> TokenStream2 {
    let descriptor = match container.rename {
        Some(ref name) => quote! {
            ::guava::schema::Schema::for_type(
                ::guava::schema::TypeDescriptor::of::<Self>().with_name(#name)
            )
        },
        None => quote!(::guava::schema::Schema::of::<Self>()),
    };

    let collection = collection.map(|collection| {
        let marker = collection.to_marker();
        quote!(.collection(#marker))
    });

    let members = stored.iter().filter(|field| !field.flatten).map(|field| {
        let name = &field.name;
        let ty = &field.field.ty;
        let markers = &field.attrs.markers;

        quote! {
            .member(
                ::guava::schema::Member::of::<#ty>(#name)
                    #(.marker(#markers))*
            )
        }
    });

    quote! {
        fn schema() -> ::guava::schema::Schema {
            #descriptor
                #collection
                #(#members)*
        }
    }
}

/// The `timestamps()` and `timestamps_mut()` methods, if a field is
/// marked `#[timestamps]`.
fn impl_timestamps(
    input: &DeriveInput,
    collection: Option<&CollectionAttr>,
    stored: &[StoredField],
) -> Result<TokenStream2> {
    let mut marked = stored.iter().filter(|field| field.attrs.timestamps);
    let tracked = collection.map_or(false, |collection| collection.track_timestamps);

    let field = match (marked.next(), marked.next()) {
        (Some(field), None) => field,
        (None, _) if tracked => return err_msg(
            &input.ident,
            "`#[collection(track_timestamps)]` requires a field marked `#[timestamps]`",
        ),
        (None, _) => return Ok(TokenStream2::new()),
        (Some(_), Some(second)) => return err_msg(second.field, "more than one `#[timestamps]` field"),
    };

    let ident = field.ident;

    Ok(quote! {
        fn timestamps(&self) -> ::std::option::Option<&::guava::entity::Timestamps> {
            ::std::option::Option::Some(&self.#ident)
        }

        fn timestamps_mut(&mut self) -> ::std::option::Option<&mut ::guava::entity::Timestamps> {
            ::std::option::Option::Some(&mut self.#ident)
        }
    })
}

/// The `normalize_case()` method, if any field is marked `#[lowercase]`
/// or `#[uppercase]`.
fn impl_normalize_case(stored: &[StoredField]) -> TokenStream2 {
    let statements: Vec<_> = stored
        .iter()
        .filter_map(|field| {
            let ident = field.ident;
            let method = if field.attrs.lowercase {
                quote!(make_lowercase)
            } else if field.attrs.uppercase {
                quote!(make_uppercase)
            } else {
                return None;
            };

            Some(quote! {
                ::guava::transform::CaseTransform::#method(&mut self.#ident);
            })
        })
        .collect();

    if statements.is_empty() {
        return TokenStream2::new();
    }

    quote! {
        fn normalize_case(&mut self) {
            #(#statements)*
        }
    }
}
