use std::sync::Arc;

use crate::{any::TypeInfo, errors::ResolveErrorKind, resolver::Resolver};

/// A value that can be produced from the container by type.
///
/// Invocable functions take their parameters as dependency resolvers,
/// see [`crate::Invocable`].
pub trait DependencyResolver: Sized {
    /// # Errors
    /// Returns the error of the underlying resolution.
    fn resolve(resolver: &Resolver<'_>) -> Result<Self, ResolveErrorKind>;

    #[must_use]
    fn type_info() -> TypeInfo;
}

impl<Dep: ?Sized + Send + Sync + 'static> DependencyResolver for Arc<Dep> {
    #[inline]
    fn resolve(resolver: &Resolver<'_>) -> Result<Self, ResolveErrorKind> {
        resolver.resolve()
    }

    #[inline]
    fn type_info() -> TypeInfo {
        TypeInfo::of::<Dep>()
    }
}

macro_rules! impl_dependency_resolver {
    (
        [$($ty:ident),*]
    ) => {
        #[allow(non_snake_case, unused_mut)]
        impl<$($ty,)*> DependencyResolver for ($($ty,)*)
        where
            $( $ty: DependencyResolver + 'static, )*
        {
            #[inline]
            #[allow(unused_variables)]
            fn resolve(resolver: &Resolver<'_>) -> Result<Self, ResolveErrorKind> {
                Ok(($($ty::resolve(resolver)?,)*))
            }

            #[inline]
            fn type_info() -> TypeInfo {
                TypeInfo::of::<Self>()
            }
        }
    };
}

all_the_tuples!(impl_dependency_resolver);
