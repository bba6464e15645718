mod attr;

use crate::autowire::attr::{parse_field_attrs, Binding};

use proc_macro2::TokenStream;
use quote::{quote, quote_spanned};
use syn::{
    spanned::Spanned as _, Data, DataStruct, DeriveInput, Error, Field, GenericArgument, Index, Member, PathArguments, Type,
};

/// Storage shape of an injected field.
enum Shape<'a> {
    Shared(&'a Type),
    OptionalShared(&'a Type),
    Cloned(&'a Type),
    OptionalCloned(&'a Type),
}

impl<'a> Shape<'a> {
    fn of(ty: &'a Type) -> Self {
        match single_generic_argument(ty, "Option") {
            Some(inner) => match single_generic_argument(inner, "Arc") {
                Some(service) => Self::OptionalShared(service),
                None => Self::OptionalCloned(inner),
            },
            None => match single_generic_argument(ty, "Arc") {
                Some(service) => Self::Shared(service),
                None => Self::Cloned(ty),
            },
        }
    }
}

/// Returns `T` if `ty` is `<wrapper><T>`, matching the last path segment only,
/// so `Arc<T>`, `sync::Arc<T>` and `std::sync::Arc<T>` are all recognized.
fn single_generic_argument<'a>(ty: &'a Type, wrapper: &str) -> Option<&'a Type> {
    let Type::Path(type_path) = ty else {
        return None;
    };
    if type_path.qself.is_some() {
        return None;
    }
    let segment = type_path.path.segments.last()?;
    if segment.ident != wrapper {
        return None;
    }
    let PathArguments::AngleBracketed(arguments) = &segment.arguments else {
        return None;
    };
    let mut arguments = arguments.args.iter();
    match (arguments.next(), arguments.next()) {
        (Some(GenericArgument::Type(inner)), None) => Some(inner),
        _ => None,
    }
}

fn expand_field(member: &Member, field: &Field, binding: &Binding) -> TokenStream {
    let span = field.ty.span();
    let shape = Shape::of(&field.ty);

    let (service, cloned) = match shape {
        Shape::Shared(service) | Shape::OptionalShared(service) => (service, false),
        Shape::Cloned(service) | Shape::OptionalCloned(service) => (service, true),
    };
    let resolve = match (binding, cloned) {
        (Binding::Type, false) => quote_spanned! { span => resolver.resolve::<#service>()? },
        (Binding::Type, true) => quote_spanned! { span => resolver.resolve_cloned::<#service>()? },
        (Binding::Token(token), false) => quote_spanned! { span => resolver.resolve_by_token::<#service>(#token)? },
        (Binding::Token(token), true) => quote_spanned! { span => resolver.resolve_by_token_cloned::<#service>(#token)? },
    };

    match shape {
        Shape::OptionalShared(_) | Shape::OptionalCloned(_) => quote! {
            self.#member = ::core::option::Option::Some(#resolve);
        },
        Shape::Shared(_) | Shape::Cloned(_) => quote! {
            self.#member = #resolve;
        },
    }
}

pub(crate) fn expand(input: DeriveInput) -> syn::Result<TokenStream> {
    let Data::Struct(DataStruct { fields, .. }) = &input.data else {
        return Err(Error::new_spanned(&input.ident, "`Autowire` can only be derived for structs"));
    };

    let mut assignments = Vec::new();
    for (index, field) in fields.iter().enumerate() {
        let Some(binding) = parse_field_attrs(&field.attrs) else {
            continue;
        };
        let binding = binding?;
        let member = match &field.ident {
            Some(ident) => Member::Named(ident.clone()),
            None => Member::Unnamed(Index::from(index)),
        };

        assignments.push(expand_field(&member, field, &binding));
    }

    let ident = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::wirebox::Autowire for #ident #ty_generics #where_clause {
            #[allow(unused_variables)]
            fn autowire(
                &mut self,
                resolver: &::wirebox::Resolver<'_>,
            ) -> ::core::result::Result<(), ::wirebox::ResolveErrorKind> {
                #( #assignments )*
                ::core::result::Result::Ok(())
            }
        }
    })
}
