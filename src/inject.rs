use std::sync::Arc;

use crate::{any::TypeInfo, dependency_resolver::DependencyResolver, errors::ResolveErrorKind, resolver::Resolver};

/// Shared (pointer form) dependency.
pub struct Inject<Dep: ?Sized>(pub Arc<Dep>);

impl<Dep: ?Sized + Send + Sync + 'static> DependencyResolver for Inject<Dep> {
    #[inline]
    fn resolve(resolver: &Resolver<'_>) -> Result<Self, ResolveErrorKind> {
        resolver.resolve().map(Self)
    }

    #[inline]
    fn type_info() -> TypeInfo {
        TypeInfo::of::<Dep>()
    }
}

/// Owned copy (value form) of a dependency.
pub struct InjectCloned<Dep>(pub Dep);

impl<Dep: Clone + Send + Sync + 'static> DependencyResolver for InjectCloned<Dep> {
    #[inline]
    fn resolve(resolver: &Resolver<'_>) -> Result<Self, ResolveErrorKind> {
        resolver.resolve_cloned().map(Self)
    }

    #[inline]
    fn type_info() -> TypeInfo {
        TypeInfo::of::<Dep>()
    }
}
