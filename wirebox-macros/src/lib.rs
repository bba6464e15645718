use proc_macro::TokenStream;
use quote::ToTokens;
use std::env::var_os;
use syn::parse::Parse;

mod attr_parsing;
mod autowire;

/// Derives `wirebox::Autowire` for a struct.
///
/// Fields annotated with `#[inject(type)]` are resolved by their declared type,
/// fields annotated with `#[inject("token")]` by the token. Other fields are left untouched.
///
/// Field shapes:
/// - `Arc<T>` and `Option<Arc<T>>` hold the shared service;
/// - `T` and `Option<T>` hold a copy of it, so `T` has to be `Clone`.
#[proc_macro_derive(Autowire, attributes(inject))]
pub fn derive_autowire(item: TokenStream) -> TokenStream {
    expand_with(item, autowire::expand)
}

fn expand_with<F, I, K>(input: TokenStream, f: F) -> TokenStream
where
    F: FnOnce(I) -> syn::Result<K>,
    I: Parse,
    K: ToTokens,
{
    expand(syn::parse(input).and_then(f))
}

fn expand<T>(result: syn::Result<T>) -> TokenStream
where
    T: ToTokens,
{
    match result {
        Ok(tokens) => {
            let tokens = tokens.into_token_stream();
            if var_os("MACROS_DEBUG").is_some() {
                match syn::parse2::<syn::File>(tokens.clone()) {
                    Ok(file) => eprintln!("{}", prettyplease::unparse(&file)),
                    Err(_) => eprintln!("{tokens}"),
                }
            }
            tokens.into()
        }
        Err(err) => err.into_compile_error().into(),
    }
}
