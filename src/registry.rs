use once_cell::sync::OnceCell;
use std::{
    collections::BTreeMap,
    fmt::{self, Debug, Display, Formatter},
    sync::Arc,
};

use crate::{
    any::{erase, Instance, ServiceKey, TypeInfo},
    factory::{boxed_arc_factory, boxed_factory, prototype_factory, BoxedFactory, Factory},
};

/// Caching behavior of a registration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Lifetime {
    /// One instance per registration, provided eagerly or created once from the factory.
    #[default]
    Singleton,
    /// A new instance from the factory on every resolution.
    Transient,
    /// One instance per scope key, created on first resolution inside the scope.
    Scoped,
}

impl Display for Lifetime {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Lifetime::Singleton => "singleton",
            Lifetime::Transient => "transient",
            Lifetime::Scoped => "scoped",
        })
    }
}

/// Stored recipe for producing a service.
///
/// At least one of the instance or the factory has to be set for resolution to succeed.
/// For singletons the instance cell doubles as the cache of the factory result.
pub struct Registration {
    pub(crate) instance: OnceCell<Instance>,
    pub(crate) factory: Option<BoxedFactory>,
    pub(crate) lifetime: Lifetime,
    pub(crate) provides: TypeInfo,
}

impl Registration {
    #[inline]
    #[must_use]
    pub fn instance<T: Send + Sync + 'static>(value: T, lifetime: Lifetime) -> Self {
        Self::arc_instance(Arc::new(value), lifetime)
    }

    #[inline]
    #[must_use]
    pub fn arc_instance<T: ?Sized + Send + Sync + 'static>(value: Arc<T>, lifetime: Lifetime) -> Self {
        Self {
            instance: OnceCell::with_value(erase(value)),
            factory: None,
            lifetime,
            provides: TypeInfo::of::<T>(),
        }
    }

    #[inline]
    #[must_use]
    pub fn factory<T, F>(factory: F, lifetime: Lifetime) -> Self
    where
        T: Send + Sync + 'static,
        F: Factory<T>,
    {
        Self::from_boxed_factory::<T>(boxed_factory(factory), lifetime)
    }

    #[inline]
    #[must_use]
    pub fn arc_factory<T, F>(factory: F, lifetime: Lifetime) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Factory<Arc<T>>,
    {
        Self::from_boxed_factory::<T>(boxed_arc_factory(factory), lifetime)
    }

    /// Transient registration producing `T::default()` on each resolution.
    #[inline]
    #[must_use]
    pub fn prototype<T: Default + Send + Sync + 'static>() -> Self {
        Self::from_boxed_factory::<T>(prototype_factory::<T>(), Lifetime::Transient)
    }

    /// Registration without a producer. Resolving it fails until it is replaced.
    #[inline]
    #[must_use]
    pub fn empty<T: ?Sized + 'static>(lifetime: Lifetime) -> Self {
        Self {
            instance: OnceCell::new(),
            factory: None,
            lifetime,
            provides: TypeInfo::of::<T>(),
        }
    }

    #[inline]
    #[must_use]
    pub const fn lifetime(&self) -> Lifetime {
        self.lifetime
    }

    #[inline]
    #[must_use]
    pub const fn provides(&self) -> TypeInfo {
        self.provides
    }

    #[inline]
    #[must_use]
    fn from_boxed_factory<T: ?Sized + 'static>(factory: BoxedFactory, lifetime: Lifetime) -> Self {
        Self {
            instance: OnceCell::new(),
            factory: Some(factory),
            lifetime,
            provides: TypeInfo::of::<T>(),
        }
    }
}

impl Debug for Registration {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("provides", &self.provides)
            .field("lifetime", &self.lifetime)
            .field("has_instance", &self.instance.get().is_some())
            .field("has_factory", &self.factory.is_some())
            .finish()
    }
}

#[derive(Default)]
pub(crate) struct Registry {
    types: BTreeMap<TypeInfo, Arc<Registration>>,
    tokens: BTreeMap<Box<str>, Arc<Registration>>,
}

impl Registry {
    #[inline]
    pub(crate) fn insert(&mut self, key: ServiceKey, registration: Registration) -> Option<Arc<Registration>> {
        let registration = Arc::new(registration);
        match key {
            ServiceKey::Type(type_info) => self.types.insert(type_info, registration),
            ServiceKey::Token(token) => self.tokens.insert(token, registration),
        }
    }

    #[inline]
    #[must_use]
    pub(crate) fn get(&self, key: &ServiceKey) -> Option<Arc<Registration>> {
        match key {
            ServiceKey::Type(type_info) => self.types.get(type_info),
            ServiceKey::Token(token) => self.tokens.get(token),
        }
        .cloned()
    }

    #[inline]
    #[must_use]
    pub(crate) fn contains(&self, key: &ServiceKey) -> bool {
        match key {
            ServiceKey::Type(type_info) => self.types.contains_key(type_info),
            ServiceKey::Token(token) => self.tokens.contains_key(token),
        }
    }

    #[inline]
    #[must_use]
    pub(crate) fn len(&self) -> usize {
        self.types.len() + self.tokens.len()
    }
}
