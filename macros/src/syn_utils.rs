use proc_macro2::TokenStream;
use syn::{Attribute, LitStr, Result};

macro_rules! bail {
    ($span:expr, $fmt:literal $(,)?) => {
        return ::std::result::Result::Err(::syn::Error::new($span, ::std::format!($fmt)))
    };
    ($span:expr, $fmt:literal, $($arg:tt)*) => {
        return ::std::result::Result::Err(::syn::Error::new($span, ::std::format!($fmt, $($arg)*)))
    };
}

pub fn into_macro_output(input: Result<TokenStream>) -> proc_macro::TokenStream {
    match input {
        Ok(s) => s,
        Err(e) => e.to_compile_error(),
    }
    .into()
}

/// Reads `key = "..."` from attributes of the form `#[name(key = "...")]`.
///
/// Later attributes override earlier ones. Any other key is an error.
pub fn str_arg(attrs: &[Attribute], name: &str, key: &str) -> Result<Option<LitStr>> {
    let mut value = None;
    for attr in attrs {
        if !attr.path().is_ident(name) {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident(key) {
                value = Some(meta.value()?.parse::<LitStr>()?);
                Ok(())
            } else {
                Err(meta.error(format!("expected `{key} = \"...\"`")))
            }
        })?;
    }
    Ok(value)
}
