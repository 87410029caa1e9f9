//! Errors potentially happening while `#[derive]`ing `Entity`.

use std::fmt::Display;
use quote::ToTokens;

/// Convenience type alias for a result that holds a `syn::Error` value.
pub type Result<T> = std::result::Result<T, syn::Error>;

/// Fails with `message`, pointing at `tokens` in the user's code.
pub fn err_msg<T, S: ToTokens, M: Display>(tokens: S, message: M) -> Result<T> {
    Err(syn::Error::new_spanned(tokens, message))
}

/// Like `err_msg()` but with `format!()`-style arguments.
macro_rules! err_fmt {
    ($tokens:expr, $($arg:tt)*) => {
        $crate::error::err_msg($tokens, format!($($arg)*))
    }
}
