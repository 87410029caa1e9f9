//! Helpers for conveniently specifying per-entity driver options
//! while still being able to use `#[derive(Entity)]`.

use proc_macro2::{ TokenStream, Span };
use syn::{ Attribute, Ident, Path, LitStr };
use quote::{ ToTokens, TokenStreamExt };
use crate::error::Result;

/// The option methods of `Entity` and their return types, as re-exported
/// by the guava prelude.
const OPTION_METHODS: &[(&str, &str)] = &[
    ("query_options",   "FindOptions"),
    ("count_options",   "CountOptions"),
    ("delete_options",  "DeleteOptions"),
    ("replace_options", "ReplaceOptions"),
];

/// This type can tokenize itself in a way that, when quoted inside an
/// `impl Entity for T`, will expand to the option methods overriding the
/// defaults of the `Entity` trait. Each overridden method calls a
/// user-specified function.
#[derive(Debug, Clone, Default)]
pub struct EntityOptions(Vec<(&'static str, &'static str, Path)>);

impl EntityOptions {
    /// Creates an options descriptor from the `#[options(...)]` attribute.
    pub fn from_attributes(attrs: &[Attribute]) -> Result<Self> {
        let mut options = EntityOptions::default();

        for attr in attrs.iter().filter(|attr| attr.path().is_ident("options")) {
            attr.parse_nested_meta(|meta| {
                let method = OPTION_METHODS
                    .iter()
                    .find(|&&(name, _)| meta.path.is_ident(name));

                let &(fn_name, type_name) = match method {
                    Some(method) => method,
                    None => return Err(meta.error(
                        "expected one of `query_options`, `count_options`, `delete_options`, `replace_options`"
                    )),
                };

                if options.0.iter().any(|&(name, ..)| name == fn_name) {
                    return err_fmt!(&meta.path, "`{}` is specified more than once", fn_name);
                }

                let path_str: LitStr = meta.value()?.parse()?;
                let path: Path = path_str.parse()?;

                options.0.push((fn_name, type_name, path));
                Ok(())
            })?;
        }

        Ok(options)
    }
}

impl ToTokens for EntityOptions {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        for &(fn_name, type_name, ref callee_path) in &self.0 {
            let fn_name = Ident::new(fn_name, Span::call_site());
            let type_name = Ident::new(type_name, Span::call_site());

            tokens.append_all(quote! {
                fn #fn_name() -> ::guava::prelude::#type_name {
                    #callee_path()
                }
            });
        }
    }
}
