use syn::{
    parse::{Parse, ParseStream},
    Attribute, LitStr, Token,
};

use crate::attr_parsing::{parse_attrs, Combine};

/// What a field is resolved by.
pub(crate) enum Binding {
    /// `#[inject(type)]` or `#[inject("type")]`
    Type,
    /// `#[inject("<token>")]`
    Token(LitStr),
}

impl Parse for Binding {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let lh = input.lookahead1();
        let binding = if lh.peek(Token![type]) {
            input.parse::<Token![type]>()?;
            Self::Type
        } else if lh.peek(LitStr) {
            let lit = input.parse::<LitStr>()?;
            match lit.value().as_str() {
                "type" => Self::Type,
                "" => return Err(syn::Error::new_spanned(lit, "token can't be empty")),
                _ => Self::Token(lit),
            }
        } else {
            return Err(lh.error());
        };

        if !input.is_empty() {
            return Err(input.error("unexpected tokens after binding"));
        }

        Ok(binding)
    }
}

impl Combine for Binding {
    fn combine(self, _other: Self) -> syn::Result<Self> {
        Err(syn::Error::new(proc_macro2::Span::call_site(), "`inject` specified more than once"))
    }
}

pub(crate) fn parse_field_attrs(attrs: &[Attribute]) -> Option<syn::Result<Binding>> {
    parse_attrs("inject", attrs).map(|result| result.map_err(|(err, attr)| syn::Error::new_spanned(attr, err)))
}
