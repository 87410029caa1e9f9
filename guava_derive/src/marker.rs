//! Parsing the collection and field marker attributes into the
//! expressions that build the corresponding `guava::marker` values.

use proc_macro2::TokenStream;
use syn::{ Attribute, LitStr, Meta };
use syn::meta::ParseNestedMeta;
use crate::{
    meta::{ parse_flag, parse_string },
    error::{ Result, err_msg },
};

/// Every attribute the derive macro understands on fields.
pub const FIELD_ATTRIBUTES: &[&str] = &[
    "unique_index",
    "single_field_index",
    "geospatial_index",
    "compound_index",
    "lowercase",
    "uppercase",
    "timestamps",
];

/// `#[collection(name = "...", track_timestamps)]`.
#[derive(Debug, Clone)]
pub struct CollectionAttr {
    /// Explicit collection name.
    pub name: Option<LitStr>,
    /// Whether timestamps are maintained on save.
    pub track_timestamps: bool,
}

impl CollectionAttr {
    /// Finds and parses the collection attribute of the type, if any.
    pub fn from_attributes(attrs: &[Attribute]) -> Result<Option<Self>> {
        let mut attrs = attrs.iter().filter(|attr| attr.path().is_ident("collection"));

        let attr = match attrs.next() {
            Some(attr) => attr,
            None => return Ok(None),
        };

        if let Some(duplicate) = attrs.next() {
            return err_msg(duplicate, "duplicate `#[collection]` attribute");
        }

        let mut collection = CollectionAttr {
            name: None,
            track_timestamps: false,
        };

        if let Meta::Path(_) = attr.meta {
            return Ok(Some(collection));
        }

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                collection.name = Some(parse_string(&meta)?);
                Ok(())
            } else if meta.path.is_ident("track_timestamps") {
                collection.track_timestamps = parse_flag(&meta)?;
                Ok(())
            } else {
                Err(meta.error("expected `name` or `track_timestamps`"))
            }
        })?;

        Ok(Some(collection))
    }

    /// The `CollectionMarker` expression.
    pub fn to_marker(&self) -> TokenStream {
        let name = option_string(self.name.as_ref());
        let track = self.track_timestamps;

        quote! {
            ::guava::marker::CollectionMarker {
                name: #name,
                track_timestamps: #track,
            }
        }
    }
}

/// The guava-specific attributes of one field.
#[derive(Debug, Default)]
pub struct FieldAttrs {
    /// `FieldMarker`-convertible expressions, in attribute order.
    pub markers: Vec<TokenStream>,
    /// The field is the entity's `Timestamps`.
    pub timestamps: bool,
    /// `#[lowercase]`.
    pub lowercase: bool,
    /// `#[uppercase]`.
    pub uppercase: bool,
    /// The first marker attribute, for error reporting.
    pub first: Option<Attribute>,
}

impl FieldAttrs {
    /// Parses every marker attribute of a field. Each kind of marker may
    /// appear at most once per field.
    pub fn from_attributes(attrs: &[Attribute]) -> Result<Self> {
        let mut field = FieldAttrs::default();
        let mut seen: Vec<&str> = Vec::new();

        for attr in attrs {
            let kind = match FIELD_ATTRIBUTES.iter().find(|&&kind| attr.path().is_ident(kind)) {
                Some(&kind) => kind,
                None => continue,
            };

            if seen.contains(&kind) {
                return err_fmt!(attr, "duplicate `#[{}]` attribute", kind);
            }
            if (kind == "lowercase" && seen.contains(&"uppercase"))
                || (kind == "uppercase" && seen.contains(&"lowercase"))
            {
                return err_msg(attr, "a field can't be both `#[lowercase]` and `#[uppercase]`");
            }
            seen.push(kind);
            field.lowercase |= kind == "lowercase";
            field.uppercase |= kind == "uppercase";

            if kind == "timestamps" {
                attr.meta.require_path_only()?;
                field.timestamps = true;
            } else {
                field.markers.push(parse_marker(kind, attr)?);
                field.first.get_or_insert_with(|| attr.clone());
            }
        }

        Ok(field)
    }
}

/// The marker expression of one attribute.
fn parse_marker(kind: &str, attr: &Attribute) -> Result<TokenStream> {
    match kind {
        "lowercase" => {
            attr.meta.require_path_only()?;
            Ok(quote!(::guava::marker::Lowercase))
        }
        "uppercase" => {
            attr.meta.require_path_only()?;
            Ok(quote!(::guava::marker::Uppercase))
        }
        "unique_index" => {
            let mut sparse = false;
            let mut name = None;

            parse_optional_list(attr, |meta| {
                if meta.path.is_ident("sparse") {
                    sparse = parse_flag(&meta)?;
                } else if meta.path.is_ident("name") {
                    name = Some(parse_string(&meta)?);
                } else {
                    return Err(meta.error("expected `sparse` or `name`"));
                }
                Ok(())
            })?;

            let name = option_string(name.as_ref());

            Ok(quote! {
                ::guava::marker::UniqueIndex { sparse: #sparse, name: #name }
            })
        }
        "single_field_index" => {
            let mut order = quote!(::guava::literal::IndexOrder::Ascending);
            let mut sparse = false;
            let mut name = None;

            parse_optional_list(attr, |meta| {
                if meta.path.is_ident("order") {
                    order = index_order(&parse_string(&meta)?)?;
                } else if meta.path.is_ident("sparse") {
                    sparse = parse_flag(&meta)?;
                } else if meta.path.is_ident("name") {
                    name = Some(parse_string(&meta)?);
                } else {
                    return Err(meta.error("expected `order`, `sparse` or `name`"));
                }
                Ok(())
            })?;

            let name = option_string(name.as_ref());

            Ok(quote! {
                ::guava::marker::SingleFieldIndex { order: #order, sparse: #sparse, name: #name }
            })
        }
        "geospatial_index" => {
            let mut geo_kind = quote!(::guava::literal::GeospatialKind::TwoDSphere);
            let mut name = None;

            parse_optional_list(attr, |meta| {
                if meta.path.is_ident("kind") {
                    geo_kind = geospatial_kind(&parse_string(&meta)?)?;
                } else if meta.path.is_ident("name") {
                    name = Some(parse_string(&meta)?);
                } else {
                    return Err(meta.error("expected `kind` or `name`"));
                }
                Ok(())
            })?;

            let name = option_string(name.as_ref());

            Ok(quote! {
                ::guava::marker::GeospatialIndex { kind: #geo_kind, name: #name }
            })
        }
        "compound_index" => {
            let mut order = quote!(::guava::literal::IndexOrder::Ascending);
            let mut name = None;

            if let Meta::List(_) = attr.meta {
                attr.parse_nested_meta(|meta| {
                    if meta.path.is_ident("name") {
                        name = Some(parse_string(&meta)?);
                    } else if meta.path.is_ident("order") {
                        order = index_order(&parse_string(&meta)?)?;
                    } else {
                        return Err(meta.error("expected `name` or `order`"));
                    }
                    Ok(())
                })?;
            }

            let name = match name {
                Some(name) => name,
                None => return err_msg(attr, "`#[compound_index]` requires a `name`"),
            };

            Ok(quote! {
                ::guava::marker::CompoundIndex {
                    name: ::std::string::String::from(#name),
                    order: #order,
                }
            })
        }
        _ => err_fmt!(attr, "unknown marker `#[{}]`", kind),
    }
}

/// Parses `#[attr]` (all defaults) or `#[attr(...)]`.
fn parse_optional_list<F>(attr: &Attribute, logic: F) -> Result<()>
    where F: FnMut(ParseNestedMeta) -> Result<()>
{
    match attr.meta {
        Meta::Path(_) => Ok(()),
        Meta::List(_) => attr.parse_nested_meta(logic),
        Meta::NameValue(_) => err_msg(attr, "expected `#[marker]` or `#[marker(...)]`"),
    }
}

/// `IndexOrder` variant for a (case-insensitive) order name.
fn index_order(lit: &LitStr) -> Result<TokenStream> {
    match lit.value().to_ascii_lowercase().as_str() {
        "ascending" => Ok(quote!(::guava::literal::IndexOrder::Ascending)),
        "descending" => Ok(quote!(::guava::literal::IndexOrder::Descending)),
        "hashed" => Ok(quote!(::guava::literal::IndexOrder::Hashed)),
        other => err_fmt!(
            lit, "unknown index order `{}`, expected `ascending`, `descending` or `hashed`", other
        ),
    }
}

/// `GeospatialKind` variant for a (case-insensitive) geometry name.
fn geospatial_kind(lit: &LitStr) -> Result<TokenStream> {
    match lit.value().to_ascii_lowercase().as_str() {
        "2d" => Ok(quote!(::guava::literal::GeospatialKind::TwoD)),
        "2dsphere" => Ok(quote!(::guava::literal::GeospatialKind::TwoDSphere)),
        other => err_fmt!(lit, "unknown geospatial kind `{}`, expected `2d` or `2dsphere`", other),
    }
}

/// `Some(String::from(lit))` or `None`.
fn option_string(lit: Option<&LitStr>) -> TokenStream {
    match lit {
        Some(lit) => quote!(::std::option::Option::Some(::std::string::String::from(#lit))),
        None => quote!(::std::option::Option::None),
    }
}
