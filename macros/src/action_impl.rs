use std::collections::HashSet;

use proc_macro2::TokenStream;
use quote::quote;
use syn::{parse2, Data, DeriveInput, Result};

use crate::syn_utils::str_arg;

pub fn derive_action(input: TokenStream) -> Result<TokenStream> {
    let input: DeriveInput = parse2(input)?;
    let Data::Enum(data) = &input.data else {
        bail!(
            input.ident.span(),
            "`#[derive(Action)]` can only be applied to enums"
        );
    };

    let mut names = Vec::new();
    let mut arms = Vec::new();
    let mut seen = HashSet::new();
    for variant in &data.variants {
        let ident = &variant.ident;
        let name = match str_arg(&variant.attrs, "action", "rename")? {
            Some(name) => name.value(),
            None => ident.to_string(),
        };
        if !seen.insert(name.clone()) {
            bail!(ident.span(), "duplicate action name `{}`", name);
        }
        arms.push(quote!(Self::#ident { .. } => #name));
        names.push(name);
    }

    let ident = &input.ident;
    let (impl_g, type_g, where_g) = input.generics.split_for_impl();
    let body = if arms.is_empty() {
        quote!(match *self {})
    } else {
        quote!(match self { #(#arms,)* })
    };
    Ok(quote! {
        #[automatically_derived]
        impl #impl_g ::unidux::Action for #ident #type_g #where_g {
            const NAMES: &'static [&'static str] = &[#(#names),*];
            fn name(&self) -> &'static str {
                #body
            }
        }
    })
}
