//! Helper functions for retrieving and parsing meta attributes,
//! most notably the Serde ones that decide how a field is stored.

use syn::{ Attribute, Expr, LitBool, LitStr, Token };
use syn::meta::ParseNestedMeta;
use crate::{
    case::RenameRule,
    error::Result,
};

/// The Serde settings of the entity type itself.
#[derive(Debug, Clone, Default)]
pub struct SerdeContainer {
    /// `#[serde(rename = "...")]`: overrides the type name.
    pub rename: Option<String>,
    /// `#[serde(rename_all = "...")]`: applies to every field.
    pub rename_all: Option<RenameRule>,
}

impl SerdeContainer {
    /// Collects the relevant bits of every `#[serde(...)]` on the type.
    pub fn from_attributes(attrs: &[Attribute]) -> Result<Self> {
        let mut container = SerdeContainer::default();

        for attr in attrs.iter().filter(|attr| attr.path().is_ident("serde")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("rename") {
                    container.rename = parse_rename(&meta)?;
                } else if meta.path.is_ident("rename_all") {
                    if meta.input.peek(Token![=]) {
                        let lit: LitStr = meta.value()?.parse()?;
                        container.rename_all = Some(RenameRule::from_lit(&lit)?);
                    } else {
                        meta.parse_nested_meta(|inner| {
                            if inner.path.is_ident("serialize") {
                                let lit: LitStr = inner.value()?.parse()?;
                                container.rename_all = Some(RenameRule::from_lit(&lit)?);
                                Ok(())
                            } else {
                                skip_meta(&inner)
                            }
                        })?;
                    }
                } else {
                    skip_meta(&meta)?;
                }
                Ok(())
            })?;
        }

        Ok(container)
    }
}

/// The Serde settings of one field.
#[derive(Debug, Clone, Default)]
pub struct SerdeField {
    /// `#[serde(rename = "...")]`.
    pub rename: Option<String>,
    /// `#[serde(skip)]` or `#[serde(skip_serializing)]`: never stored.
    pub skip: bool,
    /// `#[serde(flatten)]`: stored as the fields of the value.
    pub flatten: bool,
}

impl SerdeField {
    /// Collects the relevant bits of every `#[serde(...)]` on a field.
    pub fn from_attributes(attrs: &[Attribute]) -> Result<Self> {
        let mut field = SerdeField::default();

        for attr in attrs.iter().filter(|attr| attr.path().is_ident("serde")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("rename") {
                    field.rename = parse_rename(&meta)?;
                } else if meta.path.is_ident("skip") || meta.path.is_ident("skip_serializing") {
                    field.skip = true;
                } else if meta.path.is_ident("flatten") {
                    field.flatten = true;
                } else {
                    skip_meta(&meta)?;
                }
                Ok(())
            })?;
        }

        Ok(field)
    }

    /// The key the field is serialized under.
    pub fn serialized_name(&self, ident: &str, container: &SerdeContainer) -> String {
        match (&self.rename, container.rename_all) {
            (Some(rename), _) => rename.clone(),
            (None, Some(rule)) => rule.apply_to_field(ident),
            (None, None) => ident.to_owned(),
        }
    }
}

/// Parses `rename = "..."` as well as `rename(serialize = "...")`,
/// keeping the name used for serialization.
fn parse_rename(meta: &ParseNestedMeta) -> Result<Option<String>> {
    if meta.input.peek(Token![=]) {
        let lit: LitStr = meta.value()?.parse()?;
        return Ok(Some(lit.value()));
    }

    let mut name = None;

    meta.parse_nested_meta(|inner| {
        if inner.path.is_ident("serialize") {
            let lit: LitStr = inner.value()?.parse()?;
            name = Some(lit.value());
            Ok(())
        } else {
            skip_meta(&inner)
        }
    })?;

    Ok(name)
}

/// Consumes a nested meta item nobody here is interested in, whatever
/// its shape (`word`, `key = value` or `list(...)`).
pub fn skip_meta(meta: &ParseNestedMeta) -> Result<()> {
    if meta.input.peek(Token![=]) {
        meta.value()?.parse::<Expr>()?;
    } else if meta.input.peek(syn::token::Paren) {
        meta.parse_nested_meta(|inner| skip_meta(&inner))?;
    }

    Ok(())
}

/// Parses a switch, which is either a bare word (meaning `true`)
/// or a `key = bool` pair.
pub fn parse_flag(meta: &ParseNestedMeta) -> Result<bool> {
    if meta.input.peek(Token![=]) {
        let lit: LitBool = meta.value()?.parse()?;
        Ok(lit.value)
    } else {
        Ok(true)
    }
}

/// Parses a `key = "string"` pair.
pub fn parse_string(meta: &ParseNestedMeta) -> Result<LitStr> {
    meta.value()?.parse()
}
